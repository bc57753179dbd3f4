use std::fmt;
use std::path::PathBuf;

use clap::Args;

use common::mount::CatOptions;

use super::TreeOpError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Absolute path of the file to read
    pub path: PathBuf,

    /// Byte offset to start reading at
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Maximum number of bytes to read
    #[arg(long)]
    pub length: Option<u64>,

    /// Write the content to a local file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub enum CatOutput {
    Content(Vec<u8>),
    Written { path: PathBuf, bytes: usize },
}

impl fmt::Display for CatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatOutput::Content(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "{}", text),
                Err(_) => write!(
                    f,
                    "binary content ({} bytes), use --output to save it",
                    bytes.len()
                ),
            },
            CatOutput::Written { path, bytes } => {
                write!(f, "wrote {} bytes to {}", bytes, path.display())
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = TreeOpError;
    type Output = CatOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, mount) = ctx.mount().await?;
        let options = CatOptions {
            offset: self.offset,
            length: self.length,
        };
        let content = mount.cat_with(&self.path, options).await?;

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &content).await?;
                Ok(CatOutput::Written {
                    path: path.clone(),
                    bytes: content.len(),
                })
            }
            None => Ok(CatOutput::Content(content)),
        }
    }
}
