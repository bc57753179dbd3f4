use std::path::PathBuf;

use clap::Args;

use common::linked_data::Mtime;

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Touch {
    /// Absolute path, created as an empty file if missing
    pub path: PathBuf,

    /// Seconds since the epoch, now if not set
    #[arg(long)]
    pub mtime: Option<i64>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Touch {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let mtime = self.mtime.map(|secs| Mtime::new(secs, 0));
        let root = mount.touch(&self.path, mtime).await?;
        state.save_root(&root).await?;
        Ok(root_changed("touched", &self.path, &root))
    }
}
