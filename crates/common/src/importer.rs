use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHILDREN};
use crate::linked_data::{
    Cid, CidVersion, CodecError, DataType, Metadata, PbLink, PbNode, UnixFs, DAG_PB_CODEC,
    RAW_CODEC,
};
use crate::store::{BlockStore, BlockStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("block store error: {0}")]
    BlockStore(#[from] BlockStoreError),
    #[error("invalid import options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub cid_version: CidVersion,
    /// Store leaves as raw blocks instead of UnixFS file nodes
    pub raw_leaves: bool,
    pub chunk_size: usize,
    pub max_children: usize,
    /// Applied to the root node of the file only
    pub metadata: Metadata,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            cid_version: CidVersion::V0,
            raw_leaves: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_children: DEFAULT_MAX_CHILDREN,
            metadata: Metadata::default(),
        }
    }
}

/// Root of an imported file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imported {
    pub cid: Cid,
    /// Cumulative size of the file's DAG
    pub size: u64,
    /// Content length in bytes
    pub file_size: u64,
}

/// Chunk `reader` into fixed size leaves and link them
///  together in a balanced tree of UnixFS file nodes
pub async fn import<S, R>(
    store: &S,
    mut reader: R,
    opts: &ImportOptions,
) -> Result<Imported, ImportError>
where
    S: BlockStore,
    R: AsyncRead + Unpin + Send,
{
    if opts.chunk_size == 0 {
        return Err(ImportError::InvalidOptions("chunk size must be positive".into()));
    }
    if opts.max_children < 2 {
        return Err(ImportError::InvalidOptions(
            "file nodes need room for at least two children".into(),
        ));
    }

    let mut leaves = Vec::new();
    let mut chunk = read_chunk(&mut reader, opts.chunk_size).await?;
    loop {
        let next = if chunk.len() == opts.chunk_size {
            read_chunk(&mut reader, opts.chunk_size).await?
        } else {
            Vec::new()
        };
        if leaves.is_empty() && next.is_empty() {
            // single chunk files are their own root
            let imported = put_single_chunk(store, chunk, opts).await?;
            tracing::debug!(cid = %imported.cid, size = imported.file_size, "imported file");
            return Ok(imported);
        }
        leaves.push(put_leaf(store, chunk, opts).await?);
        if next.is_empty() {
            break;
        }
        chunk = next;
    }

    let mut level = leaves;
    loop {
        let is_root = level.len() <= opts.max_children;
        let mut parents = Vec::with_capacity(level.len().div_ceil(opts.max_children));
        for children in level.chunks(opts.max_children) {
            let metadata = if is_root {
                opts.metadata
            } else {
                Metadata::default()
            };
            parents.push(put_parent(store, children, &metadata, opts.cid_version).await?);
        }
        level = parents;
        if is_root {
            break;
        }
    }

    let root = level
        .pop()
        .ok_or_else(|| ImportError::InvalidOptions("file tree has no root".into()))?;
    tracing::debug!(cid = %root.cid, size = root.file_size, "imported file");
    Ok(root)
}

async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut R,
    chunk_size: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; chunk_size];
    let mut filled = 0;
    while filled < chunk_size {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buf.truncate(filled);
    Ok(buf)
}

async fn put_leaf<S: BlockStore>(
    store: &S,
    chunk: Vec<u8>,
    opts: &ImportOptions,
) -> Result<Imported, ImportError> {
    if opts.raw_leaves {
        let len = chunk.len() as u64;
        let cid = store.put_block(CidVersion::V1, RAW_CODEC, chunk).await?;
        return Ok(Imported {
            cid,
            size: len,
            file_size: len,
        });
    }
    put_file_node(store, chunk, &Metadata::default(), opts.cid_version).await
}

/// A file that fits one chunk. Raw leaves can't carry metadata,
///  so a file with metadata always gets a UnixFS node.
async fn put_single_chunk<S: BlockStore>(
    store: &S,
    chunk: Vec<u8>,
    opts: &ImportOptions,
) -> Result<Imported, ImportError> {
    if opts.raw_leaves && opts.metadata.is_empty() {
        return put_leaf(store, chunk, opts).await;
    }
    put_file_node(store, chunk, &opts.metadata, opts.cid_version).await
}

async fn put_file_node<S: BlockStore>(
    store: &S,
    chunk: Vec<u8>,
    metadata: &Metadata,
    version: CidVersion,
) -> Result<Imported, ImportError> {
    let file_size = chunk.len() as u64;
    let mut unixfs = UnixFs::new(DataType::File);
    unixfs.filesize = Some(file_size);
    if !chunk.is_empty() {
        unixfs.data = Some(chunk);
    }
    unixfs.set_metadata(metadata);
    let bytes = PbNode {
        data: Some(unixfs.to_bytes()),
        links: vec![],
    }
    .to_bytes();
    let size = bytes.len() as u64;
    let cid = store.put_block(version, DAG_PB_CODEC, bytes).await?;
    Ok(Imported {
        cid,
        size,
        file_size,
    })
}

async fn put_parent<S: BlockStore>(
    store: &S,
    children: &[Imported],
    metadata: &Metadata,
    version: CidVersion,
) -> Result<Imported, ImportError> {
    let mut unixfs = UnixFs::new(DataType::File);
    unixfs.blocksizes = children.iter().map(|child| child.file_size).collect();
    let file_size = unixfs.blocksizes.iter().sum();
    unixfs.filesize = Some(file_size);
    unixfs.set_metadata(metadata);

    let node = PbNode {
        data: Some(unixfs.to_bytes()),
        links: children
            .iter()
            .map(|child| PbLink::new("", &child.cid, child.size))
            .collect(),
    };
    let bytes = node.to_bytes();
    let size = bytes.len() as u64 + children.iter().map(|child| child.size).sum::<u64>();
    let cid = store.put_block(version, DAG_PB_CODEC, bytes).await?;
    Ok(Imported {
        cid,
        size,
        file_size,
    })
}
