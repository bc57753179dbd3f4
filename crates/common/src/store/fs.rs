use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{BlockStore, BlockStoreError};
use crate::linked_data::Cid;

/// Block store backed by a directory on disk.
///  Each block lives in its own file named after the hex
///  encoded multihash, fanned out over two character
///  sub-directories so no single directory grows too large.
#[derive(Debug, Clone)]
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, BlockStoreError> {
        let root = path.into();
        tracing::debug!("FsBlockStore::open called with path: {:?}", root);
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn block_path(&self, cid: &Cid) -> PathBuf {
        let key = hex::encode(cid.hash().to_bytes());
        // the trailing digest bytes are uniformly distributed,
        //  unlike the multihash prefix
        let shard = &key[key.len() - 3..key.len() - 1];
        self.root.join(shard).join(key)
    }
}

#[async_trait]
impl BlockStore for FsBlockStore {
    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), BlockStoreError> {
        let path = self.block_path(cid);
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }
        let Some(parent) = path.parent() else {
            return Err(anyhow::anyhow!("block path has no parent: {:?}", path).into());
        };
        tokio::fs::create_dir_all(parent).await?;

        // write-then-rename keeps readers from ever seeing a
        //  partially written block
        let tmp = parent.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        match tokio::fs::read(self.block_path(cid)).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlockStoreError::NotFound(*cid)),
            Err(e) => Err(e.into()),
        }
    }

    async fn has(&self, cid: &Cid) -> Result<bool, BlockStoreError> {
        Ok(tokio::fs::try_exists(self.block_path(cid)).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::linked_data::{CidVersion, RAW_CODEC};

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(temp_dir.path().join("blocks"))
            .await
            .unwrap();

        let cid = store
            .put_block(CidVersion::V1, RAW_CODEC, b"some bytes".to_vec())
            .await
            .unwrap();
        assert!(store.has(&cid).await.unwrap());
        assert_eq!(
            store.get(&cid).await.unwrap(),
            Bytes::from_static(b"some bytes")
        );

        // idempotent
        store.put(&cid, Bytes::from_static(b"some bytes")).await.unwrap();
        assert_eq!(
            store.get(&cid).await.unwrap(),
            Bytes::from_static(b"some bytes")
        );
    }

    #[tokio::test]
    async fn test_fs_store_missing_block() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(temp_dir.path()).await.unwrap();
        let cid = crate::linked_data::block_cid(CidVersion::V1, RAW_CODEC, b"nope").unwrap();
        assert!(!store.has(&cid).await.unwrap());
        assert!(matches!(
            store.get(&cid).await,
            Err(BlockStoreError::NotFound(_))
        ));
    }
}
