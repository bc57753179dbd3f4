use std::path::PathBuf;

use clap::Args;

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// Absolute source path
    pub from: PathBuf,

    /// Absolute destination path, must not exist
    pub to: PathBuf,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mv {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let root = mount.mv(&self.from, &self.to).await?;
        state.save_root(&root).await?;
        Ok(root_changed("moved to", &self.to, &root))
    }
}
