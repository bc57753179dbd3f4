use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncRead;

use common::linked_data::Mtime;
use common::mount::{parse_mode, AddOptions, DEFAULT_FILE_MODE};

use super::{root_changed, TreeOpError};

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Local file to import, `-` for stdin
    pub src: PathBuf,

    /// Absolute destination path in the tree
    pub dest: PathBuf,

    /// Fail instead of creating missing parent directories
    #[arg(long)]
    pub no_parents: bool,

    /// Fail instead of replacing an existing entry
    #[arg(long)]
    pub no_clobber: bool,

    /// File mode, octal or symbolic
    #[arg(long)]
    pub mode: Option<String>,

    /// Modification time in seconds since the epoch
    #[arg(long)]
    pub mtime: Option<i64>,

    /// Store single chunk files as raw leaves
    #[arg(long)]
    pub raw_leaves: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Add {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, mut mount) = ctx.mount().await?;

        let mode = match &self.mode {
            Some(mode) => Some(parse_mode(mode, DEFAULT_FILE_MODE, false)?),
            None => None,
        };
        let options = AddOptions {
            parents: !self.no_parents,
            force: !self.no_clobber,
            mode,
            mtime: self.mtime.map(|secs| Mtime::new(secs, 0)),
            raw_leaves: self.raw_leaves.then_some(true),
        };

        let reader: Box<dyn AsyncRead + Unpin + Send> = if self.src.as_os_str() == "-" {
            Box::new(tokio::io::stdin())
        } else {
            Box::new(tokio::fs::File::open(&self.src).await?)
        };
        let root = mount.add_with(&self.dest, reader, options).await?;
        state.save_root(&root).await?;

        let added = mount.stat(&self.dest).await?;
        Ok(format!(
            "{}\n{} {}",
            root_changed("added", &self.dest, &root),
            added.cid,
            added.size
        ))
    }
}
