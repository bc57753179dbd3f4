use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::{BlockStore, BlockStoreError};
use crate::linked_data::Cid;

/// In-memory block store keyed by multihash bytes
#[derive(Debug, Clone, Default)]
pub struct MemoryBlockStore {
    inner: Arc<RwLock<HashMap<Vec<u8>, Bytes>>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blocks held
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), BlockStoreError> {
        self.inner
            .write()
            .entry(cid.hash().to_bytes())
            .or_insert(bytes);
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        self.inner
            .read()
            .get(&cid.hash().to_bytes())
            .cloned()
            .ok_or(BlockStoreError::NotFound(*cid))
    }

    async fn has(&self, cid: &Cid) -> Result<bool, BlockStoreError> {
        Ok(self.inner.read().contains_key(&cid.hash().to_bytes()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::linked_data::{block_cid, CidVersion, DAG_PB_CODEC, RAW_CODEC};

    #[tokio::test]
    async fn test_put_get_has() {
        let store = MemoryBlockStore::new();
        let cid = block_cid(CidVersion::V1, RAW_CODEC, b"hello").unwrap();
        assert!(!store.has(&cid).await.unwrap());
        assert!(matches!(
            store.get(&cid).await,
            Err(BlockStoreError::NotFound(_))
        ));

        store.put(&cid, Bytes::from_static(b"hello")).await.unwrap();
        assert!(store.has(&cid).await.unwrap());
        assert_eq!(store.get(&cid).await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_keyed_by_multihash() {
        let store = MemoryBlockStore::new();
        let v0 = store
            .put_block(CidVersion::V0, DAG_PB_CODEC, vec![0x0a, 0x02, 0x08, 0x01])
            .await
            .unwrap();
        let v1 = store
            .put_block(CidVersion::V1, DAG_PB_CODEC, vec![0x0a, 0x02, 0x08, 0x01])
            .await
            .unwrap();
        assert_ne!(v0, v1);
        assert_eq!(store.len(), 1);
        assert!(store.has(&v1).await.unwrap());
    }
}
