use std::collections::BTreeMap;

use async_stream::try_stream;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::linked_data::{
    Block, Cid, CidVersion, DataType, Link, Metadata, PbLink, PbNode, UnixFs, DAG_PB_CODEC,
    MURMUR3_X64_64_CODE,
};
use crate::store::BlockStore;

use super::hash::bucket_index;
use super::{DirError, Persisted};

/**
 * HAMT Shards
 * ===========
 * A sharded directory is a tree of dag-pb nodes. Every node
 *  owns `fanout` buckets; a name lands in the bucket given by
 *  the next `log2(fanout)` bits of its murmur3 hash. A bucket
 *  holds either a single link or a sub-shard one level down,
 *  which takes over once two names collide.
 * The tree is kept canonical: its shape only depends on the set
 *  of names it holds, never on the order they were added or
 *  removed in. Insertions split buckets lazily and removals
 *  collapse single-link sub-shards back into their parent.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ShardNode {
    depth: u32,
    fanout: u64,
    metadata: Metadata,
    buckets: BTreeMap<u32, ShardEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShardEntry {
    Link(Link),
    Shard(ShardChild),
}

/// A sub-shard, either still sitting in the block store or
///  pulled into memory to be mutated
#[derive(Debug, Clone, PartialEq)]
pub enum ShardChild {
    Stored(Persisted),
    Loaded(Box<ShardNode>),
}

pub fn validate_fanout(fanout: u64) -> Result<(), DirError> {
    if !fanout.is_power_of_two() || !(8..=65536).contains(&fanout) {
        return Err(DirError::InvalidFanout(fanout));
    }
    Ok(())
}

/// Width of the hex bucket label prefixed to shard link names
fn label_width(fanout: u64) -> usize {
    format!("{:X}", fanout - 1).len()
}

impl ShardNode {
    /// An empty root shard
    pub fn root(fanout: u64, metadata: Metadata) -> Result<Self, DirError> {
        validate_fanout(fanout)?;
        Ok(Self {
            depth: 0,
            fanout,
            metadata,
            buckets: BTreeMap::new(),
        })
    }

    fn sub_shard(&self) -> Self {
        Self {
            depth: self.depth + 1,
            fanout: self.fanout,
            metadata: Metadata::default(),
            buckets: BTreeMap::new(),
        }
    }

    pub fn from_node(node: &PbNode, unixfs: &UnixFs, depth: u32) -> Result<Self, DirError> {
        if unixfs.kind()? != DataType::HamtShard {
            return Err(DirError::InvalidShard("node is not a hamt shard".into()));
        }
        match unixfs.hash_type {
            Some(MURMUR3_X64_64_CODE) => {}
            Some(other) => {
                return Err(DirError::InvalidShard(format!(
                    "unsupported hash type {other:#x}"
                )))
            }
            None => return Err(DirError::InvalidShard("missing hash type".into())),
        }
        let fanout = unixfs
            .fanout
            .ok_or_else(|| DirError::InvalidShard("missing fanout".into()))?;
        validate_fanout(fanout)?;

        let width = label_width(fanout);
        let mut buckets = BTreeMap::new();
        for link in &node.links {
            let name = link.name();
            if name.len() < width || !name.is_char_boundary(width) {
                return Err(DirError::InvalidShard(format!("bad link name {name:?}")));
            }
            let (label, rest) = name.split_at(width);
            let index = u32::from_str_radix(label, 16)
                .ok()
                .filter(|index| u64::from(*index) < fanout)
                .ok_or_else(|| DirError::InvalidShard(format!("bad bucket label {label:?}")))?;

            let cid = link.cid()?;
            let entry = if rest.is_empty() {
                ShardEntry::Shard(ShardChild::Stored(Persisted {
                    cid,
                    size: link.tsize(),
                }))
            } else {
                ShardEntry::Link(Link::new(rest, cid, link.tsize()))
            };
            if buckets.insert(index, entry).is_some() {
                return Err(DirError::InvalidShard(format!("bucket {index} used twice")));
            }
        }

        Ok(Self {
            depth,
            fanout,
            // only the root carries metadata
            metadata: if depth == 0 {
                unixfs.metadata()
            } else {
                Metadata::default()
            },
            buckets,
        })
    }

    pub async fn load<S: BlockStore>(store: &S, cid: &Cid, depth: u32) -> Result<Self, DirError> {
        let bytes = store.get(cid).await?;
        match Block::decode(cid, bytes)? {
            Block::DagPb { node, unixfs } => Self::from_node(&node, &unixfs, depth),
            Block::Raw(_) => Err(DirError::InvalidShard(format!("{cid} is a raw block"))),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn fanout(&self) -> u64 {
        self.fanout
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub fn buckets(&self) -> &BTreeMap<u32, ShardEntry> {
        &self.buckets
    }

    fn bucket_index(&self, name: &str) -> Result<u32, DirError> {
        bucket_index(name, self.depth, self.fanout.trailing_zeros())
    }

    pub fn insert<'a, S: BlockStore>(
        &'a mut self,
        store: &'a S,
        link: Link,
        allow_overwriting: bool,
    ) -> BoxFuture<'a, Result<(), DirError>> {
        Box::pin(async move {
            let index = self.bucket_index(link.name())?;
            match self.buckets.remove(&index) {
                None => {
                    self.buckets.insert(index, ShardEntry::Link(link));
                }
                Some(ShardEntry::Link(existing)) if existing.name() == link.name() => {
                    if !allow_overwriting {
                        self.buckets.insert(index, ShardEntry::Link(existing));
                        return Err(DirError::AlreadyExists(link.name().to_string()));
                    }
                    self.buckets.insert(index, ShardEntry::Link(link));
                }
                Some(ShardEntry::Link(existing)) => {
                    tracing::debug!(
                        depth = self.depth,
                        bucket = index,
                        "bucket collision, splitting into a sub-shard"
                    );
                    let mut child = self.sub_shard();
                    child.insert(store, existing, false).await?;
                    child.insert(store, link, allow_overwriting).await?;
                    self.buckets
                        .insert(index, ShardEntry::Shard(ShardChild::Loaded(Box::new(child))));
                }
                Some(ShardEntry::Shard(child)) => {
                    let mut child = child.into_loaded(store, self.depth + 1).await?;
                    let result = child.insert(store, link, allow_overwriting).await;
                    self.buckets
                        .insert(index, ShardEntry::Shard(ShardChild::Loaded(child)));
                    result?;
                }
            }
            Ok(())
        })
    }

    pub fn remove<'a, S: BlockStore>(
        &'a mut self,
        store: &'a S,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Link, DirError>> {
        Box::pin(async move {
            let index = self.bucket_index(name)?;
            match self.buckets.remove(&index) {
                None => Err(DirError::NotFound(name.to_string())),
                Some(ShardEntry::Link(existing)) if existing.name() == name => Ok(existing),
                Some(entry @ ShardEntry::Link(_)) => {
                    self.buckets.insert(index, entry);
                    Err(DirError::NotFound(name.to_string()))
                }
                Some(ShardEntry::Shard(child)) => {
                    let mut child = child.into_loaded(store, self.depth + 1).await?;
                    let removed = match child.remove(store, name).await {
                        Ok(removed) => removed,
                        Err(e) => {
                            self.buckets
                                .insert(index, ShardEntry::Shard(ShardChild::Loaded(child)));
                            return Err(e);
                        }
                    };
                    if let Some(only) = child.take_single_link() {
                        tracing::debug!(
                            depth = child.depth,
                            bucket = index,
                            "collapsing sub-shard into its parent"
                        );
                        self.buckets.insert(index, ShardEntry::Link(only));
                    } else if !child.buckets.is_empty() {
                        self.buckets
                            .insert(index, ShardEntry::Shard(ShardChild::Loaded(child)));
                    }
                    Ok(removed)
                }
            }
        })
    }

    /// Take the only entry of a shard if it is a direct link
    fn take_single_link(&mut self) -> Option<Link> {
        if self.buckets.len() != 1 {
            return None;
        }
        if !matches!(self.buckets.values().next(), Some(ShardEntry::Link(_))) {
            return None;
        }
        match self.buckets.pop_first() {
            Some((_, ShardEntry::Link(link))) => Some(link),
            _ => None,
        }
    }

    pub fn get<'a, S: BlockStore>(
        &'a self,
        store: &'a S,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Link>, DirError>> {
        Box::pin(async move {
            let index = self.bucket_index(name)?;
            match self.buckets.get(&index) {
                None => Ok(None),
                Some(ShardEntry::Link(link)) => Ok((link.name() == name).then(|| link.clone())),
                Some(ShardEntry::Shard(ShardChild::Loaded(child))) => child.get(store, name).await,
                Some(ShardEntry::Shard(ShardChild::Stored(stored))) => {
                    let child = Self::load(store, &stored.cid, self.depth + 1).await?;
                    child.get(store, name).await
                }
            }
        })
    }

    /// Every link in the tree, bucket by bucket, descending
    ///  into sub-shards as they come up
    pub fn links<'a, S: BlockStore>(
        &'a self,
        store: &'a S,
    ) -> BoxStream<'a, Result<Link, DirError>> {
        Box::pin(try_stream! {
            for entry in self.buckets.values() {
                match entry {
                    ShardEntry::Link(link) => yield link.clone(),
                    ShardEntry::Shard(ShardChild::Loaded(child)) => {
                        let mut links = child.links(store);
                        while let Some(link) = links.next().await {
                            yield link?;
                        }
                    }
                    ShardEntry::Shard(ShardChild::Stored(stored)) => {
                        let child = Self::load(store, &stored.cid, self.depth + 1).await?;
                        let mut links = child.links(store);
                        while let Some(link) = links.next().await {
                            yield link?;
                        }
                    }
                }
            }
        })
    }

    /// Write every loaded sub-shard, deepest first, then this
    ///  node. Sub-shards that were never loaded are left as is.
    pub fn persist<'a, S: BlockStore>(
        &'a mut self,
        store: &'a S,
        version: CidVersion,
    ) -> BoxFuture<'a, Result<Persisted, DirError>> {
        Box::pin(async move {
            for entry in self.buckets.values_mut() {
                if let ShardEntry::Shard(ShardChild::Loaded(child)) = entry {
                    let stored = child.persist(store, version).await?;
                    *entry = ShardEntry::Shard(ShardChild::Stored(stored));
                }
            }
            let node = self.to_node()?;
            let bytes = node.to_bytes();
            let size = bytes.len() as u64 + node.links.iter().map(PbLink::tsize).sum::<u64>();
            let cid = store.put_block(version, DAG_PB_CODEC, bytes).await?;
            Ok(Persisted { cid, size })
        })
    }

    /// Occupied buckets as a big-endian bitfield, bit `i` for
    ///  bucket `i`, with leading zero bytes stripped
    fn bitfield(&self) -> Vec<u8> {
        let len = (self.fanout as usize).div_ceil(8);
        let mut bytes = vec![0u8; len];
        for index in self.buckets.keys() {
            let index = *index as usize;
            bytes[len - 1 - index / 8] |= 1 << (index % 8);
        }
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(len);
        bytes.split_off(first)
    }

    fn to_node(&self) -> Result<PbNode, DirError> {
        let width = label_width(self.fanout);
        let mut links = Vec::with_capacity(self.buckets.len());
        for (index, entry) in &self.buckets {
            let label = format!("{index:0width$X}");
            match entry {
                ShardEntry::Link(link) => links.push(PbLink::new(
                    format!("{label}{}", link.name()),
                    link.cid(),
                    link.size(),
                )),
                ShardEntry::Shard(ShardChild::Stored(stored)) => {
                    links.push(PbLink::new(label, &stored.cid, stored.size))
                }
                ShardEntry::Shard(ShardChild::Loaded(_)) => {
                    return Err(DirError::InvalidShard(
                        "sub-shard must be persisted before its parent".into(),
                    ))
                }
            }
        }

        let mut data = UnixFs::new(DataType::HamtShard);
        data.data = Some(self.bitfield());
        data.hash_type = Some(MURMUR3_X64_64_CODE);
        data.fanout = Some(self.fanout);
        data.set_metadata(&self.metadata);
        Ok(PbNode {
            data: Some(data.to_bytes()),
            links,
        })
    }
}

impl ShardChild {
    async fn into_loaded<S: BlockStore>(
        self,
        store: &S,
        depth: u32,
    ) -> Result<Box<ShardNode>, DirError> {
        match self {
            ShardChild::Loaded(node) => Ok(node),
            ShardChild::Stored(stored) => {
                Ok(Box::new(ShardNode::load(store, &stored.cid, depth).await?))
            }
        }
    }
}
