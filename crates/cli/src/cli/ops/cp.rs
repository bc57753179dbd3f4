use std::path::PathBuf;

use clap::Args;

use common::linked_data::Cid;
use common::mount::CpOptions;

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// Absolute source path, or a CID already in the block store
    pub from: String,

    /// Absolute destination path
    pub to: PathBuf,

    /// Create missing parent directories
    #[arg(long, short)]
    pub parents: bool,

    /// Replace an existing entry at the destination
    #[arg(long, short)]
    pub force: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cp {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let options = CpOptions {
            parents: self.parents,
            force: self.force,
        };

        let root = if self.from.starts_with('/') {
            mount
                .cp(&PathBuf::from(&self.from), &self.to, options)
                .await?
        } else {
            let cid = Cid::try_from(self.from.as_str())
                .map_err(|_| common::mount::MountError::InvalidPath(PathBuf::from(&self.from)))?;
            mount.cp_cid(&cid, &self.to, options).await?
        };
        state.save_root(&root).await?;
        Ok(root_changed("copied to", &self.to, &root))
    }
}
