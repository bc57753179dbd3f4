use std::collections::HashSet;

use futures::stream::{self, BoxStream};
use futures::StreamExt;

use crate::config::{DEFAULT_SHARD_FANOUT, DEFAULT_SHARD_SPLIT_THRESHOLD_BYTES};
use crate::linked_data::{
    Block, Cid, CidVersion, CodecError, DataType, Link, Metadata, PbNode, UnixFs,
};
use crate::store::{BlockStore, BlockStoreError};

mod flat;
pub mod hash;
mod shard;

pub use flat::FlatDirectory;
pub use shard::{ShardChild, ShardEntry, ShardNode};

#[derive(Debug, thiserror::Error)]
pub enum DirError {
    #[error("link already exists: {0}")]
    AlreadyExists(String),
    #[error("link not found: {0}")]
    NotFound(String),
    #[error("invalid link name: {0:?}")]
    InvalidName(String),
    #[error("not a directory: {0}")]
    NotADirectory(Cid),
    #[error("shard fanout must be a power of two between 8 and 65536, got {0}")]
    InvalidFanout(u64),
    #[error("shard depth {0} runs past the end of the name hash")]
    ShardDepthExceeded(u32),
    #[error("invalid shard node: {0}")]
    InvalidShard(String),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("block store error: {0}")]
    BlockStore(#[from] BlockStoreError),
}

/// Where a directory node ended up once written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persisted {
    pub cid: Cid,
    /// Cumulative size: the node's block plus everything below it
    pub size: u64,
}

/// Knobs for a single directory mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirOptions {
    pub cid_version: CidVersion,
    pub shard_split_threshold_bytes: u64,
    pub shard_fanout: u64,
    pub allow_overwriting: bool,
}

impl Default for DirOptions {
    fn default() -> Self {
        Self {
            cid_version: CidVersion::V0,
            shard_split_threshold_bytes: DEFAULT_SHARD_SPLIT_THRESHOLD_BYTES,
            shard_fanout: DEFAULT_SHARD_FANOUT,
            allow_overwriting: false,
        }
    }
}

impl DirOptions {
    pub fn allow_overwriting(mut self, allow_overwriting: bool) -> Self {
        self.allow_overwriting = allow_overwriting;
        self
    }
}

/// Link names must be non-empty and a single path segment
pub fn validate_name(name: &str) -> Result<(), DirError> {
    if name.is_empty() || name.contains('/') {
        return Err(DirError::InvalidName(name.to_string()));
    }
    Ok(())
}

/**
 * Directories
 * ===========
 * A directory is either a flat list of links or a HAMT shard
 *  tree. Callers never pick the representation: a flat
 *  directory turns into a shard as soon as its estimated size
 *  passes `shard_split_threshold_bytes`, and stays sharded
 *  from then on even if it shrinks back under it.
 * Mutations consume the directory and hand back the updated
 *  value along with where it was written. Blocks are only ever
 *  added to the store, so older roots remain readable.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Directory {
    Flat(FlatDirectory),
    Sharded(ShardNode),
}

impl Directory {
    pub fn empty(metadata: Metadata) -> Self {
        Directory::Flat(FlatDirectory::new(metadata))
    }

    pub fn from_node(cid: &Cid, node: &PbNode, unixfs: &UnixFs) -> Result<Self, DirError> {
        match unixfs.kind()? {
            DataType::Directory => Ok(Directory::Flat(FlatDirectory::from_node(node, unixfs)?)),
            DataType::HamtShard => Ok(Directory::Sharded(ShardNode::from_node(node, unixfs, 0)?)),
            _ => Err(DirError::NotADirectory(*cid)),
        }
    }

    pub async fn load<S: BlockStore>(store: &S, cid: &Cid) -> Result<Self, DirError> {
        let bytes = store.get(cid).await?;
        match Block::decode(cid, bytes)? {
            Block::DagPb { node, unixfs } => Self::from_node(cid, &node, &unixfs),
            Block::Raw(_) => Err(DirError::NotADirectory(*cid)),
        }
    }

    /// Build a directory from a batch of links in one go,
    ///  writing each node exactly once
    pub async fn create<S: BlockStore>(
        store: &S,
        links: impl IntoIterator<Item = Link>,
        metadata: Metadata,
        opts: &DirOptions,
    ) -> Result<(Self, Persisted), DirError> {
        let mut seen = HashSet::new();
        let mut flat = FlatDirectory::new(metadata);
        for link in links {
            validate_name(link.name())?;
            if !seen.insert(link.name().to_string()) {
                return Err(DirError::AlreadyExists(link.name().to_string()));
            }
            flat.insert(link, true)?;
        }

        let mut directory = if flat.serialized_size() > opts.shard_split_threshold_bytes {
            Directory::Sharded(Self::shard(store, flat, opts).await?)
        } else {
            Directory::Flat(flat)
        };
        let persisted = directory.persist(store, opts).await?;
        Ok((directory, persisted))
    }

    pub fn is_sharded(&self) -> bool {
        matches!(self, Directory::Sharded(_))
    }

    pub fn metadata(&self) -> Metadata {
        match self {
            Directory::Flat(flat) => flat.metadata(),
            Directory::Sharded(shard) => shard.metadata(),
        }
    }

    /// Re-insert every link of a flat directory into a fresh root shard
    async fn shard<S: BlockStore>(
        store: &S,
        flat: FlatDirectory,
        opts: &DirOptions,
    ) -> Result<ShardNode, DirError> {
        let (links, metadata) = flat.into_parts();
        tracing::debug!(
            links = links.len(),
            threshold = opts.shard_split_threshold_bytes,
            "converting flat directory to a hamt shard"
        );
        let mut root = ShardNode::root(opts.shard_fanout, metadata)?;
        for link in links {
            root.insert(store, link, false).await?;
        }
        Ok(root)
    }

    /// Convert to the sharded representation without writing anything.
    ///  A directory that is already sharded is returned unchanged.
    pub async fn convert_to_sharded<S: BlockStore>(
        self,
        store: &S,
        opts: &DirOptions,
    ) -> Result<Self, DirError> {
        match self {
            Directory::Flat(flat) => Ok(Directory::Sharded(Self::shard(store, flat, opts).await?)),
            sharded => Ok(sharded),
        }
    }

    pub async fn add_link<S: BlockStore>(
        self,
        store: &S,
        link: Link,
        opts: &DirOptions,
    ) -> Result<(Self, Persisted), DirError> {
        validate_name(link.name())?;
        let mut directory = match self {
            Directory::Flat(mut flat) => {
                flat.insert(link, opts.allow_overwriting)?;
                if flat.serialized_size() > opts.shard_split_threshold_bytes {
                    Directory::Sharded(Self::shard(store, flat, opts).await?)
                } else {
                    Directory::Flat(flat)
                }
            }
            Directory::Sharded(mut root) => {
                root.insert(store, link, opts.allow_overwriting).await?;
                Directory::Sharded(root)
            }
        };
        let persisted = directory.persist(store, opts).await?;
        Ok((directory, persisted))
    }

    pub async fn remove_link<S: BlockStore>(
        self,
        store: &S,
        name: &str,
        opts: &DirOptions,
    ) -> Result<(Self, Persisted), DirError> {
        let mut directory = match self {
            Directory::Flat(mut flat) => {
                flat.remove(name)?;
                Directory::Flat(flat)
            }
            Directory::Sharded(mut root) => {
                root.remove(store, name).await?;
                Directory::Sharded(root)
            }
        };
        let persisted = directory.persist(store, opts).await?;
        Ok((directory, persisted))
    }

    pub async fn set_metadata<S: BlockStore>(
        self,
        store: &S,
        metadata: Metadata,
        opts: &DirOptions,
    ) -> Result<(Self, Persisted), DirError> {
        let mut directory = self;
        match &mut directory {
            Directory::Flat(flat) => flat.set_metadata(metadata),
            Directory::Sharded(root) => root.set_metadata(metadata),
        }
        let persisted = directory.persist(store, opts).await?;
        Ok((directory, persisted))
    }

    pub async fn get_link<S: BlockStore>(
        &self,
        store: &S,
        name: &str,
    ) -> Result<Option<Link>, DirError> {
        match self {
            Directory::Flat(flat) => Ok(flat.get(name).cloned()),
            Directory::Sharded(root) => root.get(store, name).await,
        }
    }

    /// Lazily list every link. Flat directories yield in insertion
    ///  order, shards in bucket order.
    pub fn links<'a, S: BlockStore>(
        &'a self,
        store: &'a S,
    ) -> BoxStream<'a, Result<Link, DirError>> {
        match self {
            Directory::Flat(flat) => stream::iter(flat.links().iter().cloned().map(Ok)).boxed(),
            Directory::Sharded(root) => root.links(store),
        }
    }

    pub async fn persist<S: BlockStore>(
        &mut self,
        store: &S,
        opts: &DirOptions,
    ) -> Result<Persisted, DirError> {
        let persisted = match self {
            Directory::Flat(flat) => flat.persist(store, opts.cid_version).await?,
            Directory::Sharded(root) => root.persist(store, opts.cid_version).await?,
        };
        tracing::debug!(
            cid = %persisted.cid,
            sharded = self.is_sharded(),
            "directory persisted"
        );
        Ok(persisted)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::linked_data::{block_cid, RAW_CODEC};
    use crate::store::MemoryBlockStore;
    use futures::TryStreamExt;

    fn link(name: &str) -> Link {
        let cid = block_cid(CidVersion::V1, RAW_CODEC, name.as_bytes()).unwrap();
        Link::new(name, cid, 1)
    }

    #[tokio::test]
    async fn test_empty_directory_cid() {
        let store = MemoryBlockStore::new();
        let (_, persisted) =
            Directory::create(&store, [], Metadata::default(), &DirOptions::default())
                .await
                .unwrap();
        assert_eq!(
            persisted.cid.to_string(),
            "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn"
        );
        assert_eq!(persisted.size, 4);
    }

    #[tokio::test]
    async fn test_invalid_names() {
        let store = MemoryBlockStore::new();
        let opts = DirOptions::default();
        for name in ["", "a/b"] {
            let result = Directory::empty(Metadata::default())
                .add_link(&store, link(name), &opts)
                .await;
            assert!(matches!(result, Err(DirError::InvalidName(_))));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryBlockStore::new();
        let result = Directory::create(
            &store,
            [link("a"), link("a")],
            Metadata::default(),
            &DirOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(DirError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_add_get_remove() {
        let store = MemoryBlockStore::new();
        let opts = DirOptions::default();
        let (dir, _) = Directory::empty(Metadata::default())
            .add_link(&store, link("foo.txt"), &opts)
            .await
            .unwrap();
        assert_eq!(dir.get_link(&store, "foo.txt").await.unwrap(), Some(link("foo.txt")));
        assert_eq!(dir.get_link(&store, "bar.txt").await.unwrap(), None);

        let (dir, persisted) = dir.remove_link(&store, "foo.txt", &opts).await.unwrap();
        assert_eq!(
            persisted.cid.to_string(),
            "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn"
        );
        assert!(matches!(
            dir.remove_link(&store, "foo.txt", &opts).await,
            Err(DirError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_files() {
        let store = MemoryBlockStore::new();
        let cid = store
            .put_block(CidVersion::V1, RAW_CODEC, b"file".to_vec())
            .await
            .unwrap();
        assert!(matches!(
            Directory::load(&store, &cid).await,
            Err(DirError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_convert_keeps_links_and_metadata() {
        let store = MemoryBlockStore::new();
        let metadata = Metadata {
            mode: Some(0o750),
            mtime: None,
        };
        let opts = DirOptions::default();
        let (dir, _) = Directory::create(&store, [link("a"), link("b")], metadata, &opts)
            .await
            .unwrap();
        assert!(!dir.is_sharded());

        let sharded = dir.convert_to_sharded(&store, &opts).await.unwrap();
        assert!(sharded.is_sharded());
        assert_eq!(sharded.metadata(), metadata);
        let mut names: Vec<String> = sharded
            .links(&store)
            .map_ok(|l| l.name().to_string())
            .try_collect()
            .await
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }
}
