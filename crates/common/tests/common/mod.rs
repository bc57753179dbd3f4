//! Shared test utilities for mount integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::config::Config;
use common::linked_data::{block_cid, Cid, CidVersion, Link, RAW_CODEC};
use common::mount::Mount;
use common::store::{BlockStore, BlockStoreError, FsBlockStore, MemoryBlockStore};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route library logs through the test harness, filtered by `RUST_LOG`
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Set up a test environment with a new mount over an on-disk block store
pub async fn setup_test_env() -> (Mount<FsBlockStore>, FsBlockStore, TempDir) {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let store = FsBlockStore::open(temp_dir.path().join("blocks"))
        .await
        .unwrap();

    let mount = Mount::init(&store, Config::default()).await.unwrap();

    (mount, store, temp_dir)
}

/// Same as [`setup_test_env`], in memory and with a custom config
pub async fn setup_memory_env(config: Config) -> (Mount<MemoryBlockStore>, MemoryBlockStore) {
    init_logging();
    let store = MemoryBlockStore::new();
    let mount = Mount::init(&store, config).await.unwrap();
    (mount, store)
}

/// A link to a raw leaf holding the link's own name
pub fn leaf_link(name: &str) -> Link {
    let cid: Cid = block_cid(CidVersion::V1, RAW_CODEC, name.as_bytes()).unwrap();
    Link::new(name, cid, name.len() as u64)
}

/// Estimated size of a flat directory holding `links`
pub fn estimated_size(links: &[Link]) -> u64 {
    links
        .iter()
        .map(|link| (link.name().len() + link.cid().to_bytes().len()) as u64)
        .sum()
}

/// A memory store that starts refusing writes once its budget
///  of puts is spent. Unlimited until [`FailingStore::fail_after`].
#[derive(Debug, Clone)]
pub struct FailingStore {
    inner: MemoryBlockStore,
    puts_left: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBlockStore::new(),
            puts_left: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    pub fn fail_after(&self, puts: usize) {
        self.puts_left.store(puts, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlockStore for FailingStore {
    async fn put(&self, cid: &Cid, bytes: Bytes) -> Result<(), BlockStoreError> {
        let spent = self
            .puts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_err();
        if spent {
            return Err(BlockStoreError::Default(anyhow::anyhow!("store is full")));
        }
        self.inner.put(cid, bytes).await
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        self.inner.get(cid).await
    }

    async fn has(&self, cid: &Cid) -> Result<bool, BlockStoreError> {
        self.inner.has(cid).await
    }
}
