use clap::Args;

use common::linked_data::{CidVersion, CodecError};

use crate::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// CID version for new nodes (0 or 1)
    #[arg(long, default_value_t = 0)]
    pub cid_version: u8,

    /// Store single chunk files as raw leaves
    #[arg(long)]
    pub raw_leaves: bool,

    /// Estimated directory size, in bytes, past which directories are sharded
    #[arg(long)]
    pub shard_split_threshold: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("invalid option: {0}")]
    Codec(#[from] CodecError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::default();
        config.dag.cid_version = CidVersion::try_from(self.cid_version)?;
        config.dag.raw_leaves = self.raw_leaves;
        if let Some(threshold) = self.shard_split_threshold {
            config.dag.shard_split_threshold_bytes = threshold;
        }

        let state = AppState::init(ctx.config_path.clone(), config).await?;
        let root = state.root().await?;
        Ok(format!(
            "initialized dagfs at {}\nroot: {}",
            state.dir().display(),
            root
        ))
    }
}
