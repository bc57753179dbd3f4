use std::path::PathBuf;

use clap::Args;

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Chmod {
    /// Octal (`755`) or symbolic (`u+x,go-w`) mode
    pub mode: String,

    /// Absolute path to change
    pub path: PathBuf,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Chmod {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let root = mount.chmod(&self.path, &self.mode).await?;
        state.save_root(&root).await?;
        Ok(root_changed("changed mode of", &self.path, &root))
    }
}
