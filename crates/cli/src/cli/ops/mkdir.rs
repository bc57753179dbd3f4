use std::path::PathBuf;

use clap::Args;

use common::linked_data::Mtime;
use common::mount::{parse_mode, MkdirOptions, DEFAULT_DIRECTORY_MODE};

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Absolute path of the new directory
    pub path: PathBuf,

    /// Create missing parents, no error if the directory exists
    #[arg(long, short)]
    pub parents: bool,

    /// Directory mode, octal or symbolic
    #[arg(long)]
    pub mode: Option<String>,

    /// Modification time in seconds since the epoch
    #[arg(long)]
    pub mtime: Option<i64>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mkdir {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;
        let mode = match &self.mode {
            Some(mode) => Some(parse_mode(mode, DEFAULT_DIRECTORY_MODE, true)?),
            None => None,
        };
        let options = MkdirOptions {
            parents: self.parents,
            mode,
            mtime: self.mtime.map(|secs| Mtime::new(secs, 0)),
        };
        let root = mount.mkdir_with(&self.path, options).await?;
        state.save_root(&root).await?;
        Ok(root_changed("created", &self.path, &root))
    }
}
