use clap::Args;

use common::linked_data::Cid;
use common::mount::{Mount, MountError};

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Root {
    /// Switch to another root directory already in the block store
    #[arg(long)]
    pub set: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RootError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error("invalid cid {0:?}")]
    InvalidCid(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Root {
    type Error = RootError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let Some(set) = &self.set else {
            return Ok(state.root().await?.to_string());
        };

        let cid = Cid::try_from(set.as_str()).map_err(|_| RootError::InvalidCid(set.clone()))?;
        // only directories can be mounted
        let store = state.store().await?;
        Mount::load(&cid, &store, state.config.dag.clone()).await?;
        state.save_root(&cid).await?;
        Ok(cid.to_string())
    }
}
