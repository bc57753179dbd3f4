use crate::linked_data::{CidVersion, DataType, Link, Metadata, PbNode, UnixFs, DAG_PB_CODEC};
use crate::store::BlockStore;

use super::{DirError, Persisted};

/// A directory stored as a single dag-pb node listing
///  every link. Links keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatDirectory {
    links: Vec<Link>,
    metadata: Metadata,
}

impl FlatDirectory {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            links: Vec::new(),
            metadata,
        }
    }

    pub fn from_node(node: &PbNode, unixfs: &UnixFs) -> Result<Self, DirError> {
        let links = node
            .links
            .iter()
            .map(|link| Ok(Link::new(link.name(), link.cid()?, link.tsize())))
            .collect::<Result<Vec<_>, DirError>>()?;
        Ok(Self {
            links,
            metadata: unixfs.metadata(),
        })
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub fn get(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.name() == name)
    }

    /// Insert a link, replacing a same-named one in place when
    ///  overwriting is allowed
    pub fn insert(&mut self, link: Link, allow_overwriting: bool) -> Result<(), DirError> {
        match self.links.iter_mut().find(|l| l.name() == link.name()) {
            Some(_) if !allow_overwriting => Err(DirError::AlreadyExists(link.name().to_string())),
            Some(existing) => {
                *existing = link;
                Ok(())
            }
            None => {
                self.links.push(link);
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<Link, DirError> {
        let position = self
            .links
            .iter()
            .position(|link| link.name() == name)
            .ok_or_else(|| DirError::NotFound(name.to_string()))?;
        Ok(self.links.remove(position))
    }

    /// Estimated encoded size, the figure compared against
    ///  the shard split threshold
    pub fn serialized_size(&self) -> u64 {
        self.links.iter().map(Link::estimated_size).sum()
    }

    pub fn into_parts(self) -> (Vec<Link>, Metadata) {
        (self.links, self.metadata)
    }

    pub fn to_node(&self) -> PbNode {
        let mut data = UnixFs::new(DataType::Directory);
        data.set_metadata(&self.metadata);
        PbNode {
            data: Some(data.to_bytes()),
            links: self.links.iter().map(Link::to_pb).collect(),
        }
    }

    pub async fn persist<S: BlockStore>(
        &self,
        store: &S,
        version: CidVersion,
    ) -> Result<Persisted, DirError> {
        let bytes = self.to_node().to_bytes();
        let size = bytes.len() as u64 + self.links.iter().map(Link::size).sum::<u64>();
        let cid = store.put_block(version, DAG_PB_CODEC, bytes).await?;
        Ok(Persisted { cid, size })
    }
}
