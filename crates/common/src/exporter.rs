use futures::future::BoxFuture;
use serde::Serialize;

use crate::dir::{DirError, Directory};
use crate::linked_data::{Block, Cid, CodecError, DataType, Metadata};
use crate::store::{BlockStore, BlockStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("block not found: {0}")]
    NotFound(Cid),
    /// Segment `depth` (counted from zero) names no link
    #[error("path not found: {path}")]
    PathNotFound { path: String, depth: usize },
    /// The node reached after `depth` segments can't be descended into
    #[error("not a directory: {path}")]
    NotADirectory { path: String, depth: usize },
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("directory error: {0}")]
    Directory(#[from] DirError),
    #[error("block store error: {0}")]
    BlockStore(BlockStoreError),
}

impl From<BlockStoreError> for ExportError {
    fn from(e: BlockStoreError) -> Self {
        match e {
            BlockStoreError::NotFound(cid) => ExportError::NotFound(cid),
            e => ExportError::BlockStore(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Raw,
}

/// A node found by walking a tree, along with everything needed
///  to describe it without going back to the store
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub cid: Cid,
    /// Last path segment, or the CID itself for the starting node
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Content bytes for files and raw leaves, zero for directories
    pub size: u64,
    pub cumulative_size: u64,
    pub metadata: Metadata,
    pub block: Block,
}

impl Entry {
    fn new(cid: Cid, name: String, path: String, block: Block) -> Result<Self, ExportError> {
        let cumulative_size = block.encoded_len() + block.links_size();
        let (kind, size, metadata) = match &block {
            Block::Raw(bytes) => (EntryKind::Raw, bytes.len() as u64, Metadata::default()),
            Block::DagPb { unixfs, .. } => match unixfs.kind()? {
                DataType::Directory | DataType::HamtShard => {
                    (EntryKind::Directory, 0, unixfs.metadata())
                }
                _ => (EntryKind::File, unixfs.file_size(), unixfs.metadata()),
            },
        };
        Ok(Self {
            cid,
            name,
            path,
            kind,
            size,
            cumulative_size,
            metadata,
            block,
        })
    }

    pub fn is_sharded(&self) -> bool {
        matches!(
            &self.block,
            Block::DagPb { unixfs, .. } if unixfs.data_type == DataType::HamtShard as i32
        )
    }

    /// Number of links leaving this node
    pub fn blocks(&self) -> usize {
        match &self.block {
            Block::DagPb { node, .. } => node.links.len(),
            Block::Raw(_) => 0,
        }
    }

    pub fn directory(&self) -> Result<Directory, DirError> {
        match &self.block {
            Block::DagPb { node, unixfs } => Directory::from_node(&self.cid, node, unixfs),
            Block::Raw(_) => Err(DirError::NotADirectory(self.cid)),
        }
    }
}

async fn load_entry<S: BlockStore>(
    store: &S,
    cid: &Cid,
    name: String,
    path: String,
) -> Result<Entry, ExportError> {
    let bytes = store.get(cid).await?;
    let block = Block::decode(cid, bytes)?;
    Entry::new(*cid, name, path, block)
}

/// Resolve `cid`, then walk `path` (slash separated, relative
///  to `cid`) through flat and sharded directories alike
#[tracing::instrument(skip(store))]
pub async fn resolve<S: BlockStore>(
    store: &S,
    cid: &Cid,
    path: Option<&str>,
) -> Result<Entry, ExportError> {
    let mut entry = load_entry(store, cid, cid.to_string(), cid.to_string()).await?;
    let segments = path.unwrap_or_default().split('/').filter(|s| !s.is_empty());
    for (depth, segment) in segments.enumerate() {
        if entry.kind != EntryKind::Directory {
            return Err(ExportError::NotADirectory {
                path: entry.path,
                depth,
            });
        }
        let path = format!("{}/{}", entry.path, segment);
        let link = match entry.directory()?.get_link(store, segment).await? {
            Some(link) => link,
            None => return Err(ExportError::PathNotFound { path, depth }),
        };
        entry = load_entry(store, link.cid(), segment.to_string(), path).await?;
    }
    Ok(entry)
}

/// Read up to `length` bytes of a file entry starting at `offset`
pub async fn read<S: BlockStore>(
    store: &S,
    entry: &Entry,
    offset: u64,
    length: Option<u64>,
) -> Result<Vec<u8>, ExportError> {
    if entry.kind == EntryKind::Directory {
        return Err(ExportError::NotAFile(entry.path.clone()));
    }
    let end = length
        .map(|length| offset.saturating_add(length))
        .unwrap_or(u64::MAX)
        .min(entry.size);
    let mut out = Vec::new();
    if offset < end {
        read_range(store, &entry.block, offset, end, &mut out).await?;
    }
    Ok(out)
}

/// Append the bytes in `[start, end)` of the content under
///  `block` to `out`, loading only the children that overlap
fn read_range<'a, S: BlockStore>(
    store: &'a S,
    block: &'a Block,
    start: u64,
    end: u64,
    out: &'a mut Vec<u8>,
) -> BoxFuture<'a, Result<(), ExportError>> {
    Box::pin(async move {
        let (node, unixfs) = match block {
            Block::Raw(bytes) => {
                out.extend_from_slice(slice(bytes, start, end));
                return Ok(());
            }
            Block::DagPb { node, unixfs } => (node, unixfs),
        };

        let data = unixfs.data.as_deref().unwrap_or_default();
        out.extend_from_slice(slice(data, start, end));

        let mut position = data.len() as u64;
        for (i, link) in node.links.iter().enumerate() {
            if position >= end {
                break;
            }
            let cid = link.cid()?;
            let (child, child_size) = match unixfs.blocksizes.get(i) {
                Some(size) => (None, *size),
                None => {
                    let child = load_entry(store, &cid, String::new(), String::new()).await?;
                    let size = child.size;
                    (Some(child), size)
                }
            };
            let child_end = position + child_size;
            if child_end > start {
                let child = match child {
                    Some(child) => child,
                    None => load_entry(store, &cid, String::new(), String::new()).await?,
                };
                read_range(
                    store,
                    &child.block,
                    start.saturating_sub(position),
                    end.min(child_end) - position,
                    out,
                )
                .await?;
            }
            position = child_end;
        }
        Ok(())
    })
}

fn slice(bytes: &[u8], start: u64, end: u64) -> &[u8] {
    let len = bytes.len() as u64;
    let (start, end) = (start.min(len) as usize, end.min(len) as usize);
    &bytes[start..end.max(start)]
}
