use async_trait::async_trait;
use bytes::Bytes;

use crate::linked_data::{block_cid, Cid, CidVersion, CodecError};

mod fs;
mod memory;

pub use fs::FsBlockStore;
pub use memory::MemoryBlockStore;

#[derive(Debug, thiserror::Error)]
pub enum BlockStoreError {
    #[error("block not found: {0}")]
    NotFound(Cid),
    #[error("block store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("block store error: {0}")]
    Default(#[from] anyhow::Error),
}

/**
 * Block Store
 * ===========
 * Content addressed storage for the blocks making up a tree.
 *  Blocks are keyed by their multihash, so the same bytes
 *  stored under a v0 and a v1 CID occupy a single entry and
 *  writing a block twice is a no-op.
 * Implementations must tolerate concurrent readers and writers.
 */
#[async_trait]
pub trait BlockStore: Clone + Send + Sync + std::fmt::Debug + 'static {
    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), BlockStoreError>;

    /// Fetch a block, failing with `NotFound` if it was never stored
    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError>;

    async fn has(&self, cid: &Cid) -> Result<bool, BlockStoreError>;

    /// Hash `bytes` into a CID of the given version and codec,
    ///  store them, and hand back the CID
    async fn put_block(
        &self,
        version: CidVersion,
        codec: u64,
        bytes: Vec<u8>,
    ) -> Result<Cid, BlockStoreError> {
        let cid = block_cid(version, codec, &bytes)?;
        tracing::debug!(cid = %cid, len = bytes.len(), "put block");
        self.put(&cid, Bytes::from(bytes)).await?;
        Ok(cid)
    }
}
