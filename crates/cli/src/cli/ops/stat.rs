use std::path::PathBuf;

use clap::Args;

use super::TreeOpError;

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Absolute path to describe
    #[arg(default_value = "/")]
    pub path: PathBuf,

    /// Print as json
    #[arg(long)]
    pub json: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stat {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, mount) = ctx.mount().await?;
        let stat = mount.stat(&self.path).await?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&stat)?);
        }
        let mtime = stat
            .mtime
            .map(|mtime| format!("{}.{:09}", mtime.secs, mtime.nsecs))
            .unwrap_or_else(|| "-".to_string());
        Ok(format!(
            "cid: {}\nkind: {:?}\nsize: {}\ncumulative size: {}\nlinks: {}\nmode: {:04o}\nmtime: {}\nsharded: {}",
            stat.cid,
            stat.kind,
            stat.size,
            stat.cumulative_size,
            stat.blocks,
            stat.mode,
            mtime,
            stat.sharded
        ))
    }
}
