use std::path::PathBuf;

use clap::Args;

use common::mount::RmOptions;

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Absolute path to remove
    pub path: PathBuf,

    /// Allow removing directories
    #[arg(long, short)]
    pub recursive: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let root = mount
            .rm_with(
                &self.path,
                RmOptions {
                    recursive: self.recursive,
                },
            )
            .await?;
        state.save_root(&root).await?;
        Ok(root_changed("removed", &self.path, &root))
    }
}
