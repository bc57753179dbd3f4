use std::path::PathBuf;

use clap::Args;

use super::TreeOpError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Absolute path to list
    #[arg(default_value = "/")]
    pub path: PathBuf,

    /// Print the listing as json
    #[arg(long)]
    pub json: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = TreeOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, mount) = ctx.mount().await?;
        let items = mount.ls(&self.path).await?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&items)?);
        }
        Ok(items
            .iter()
            .map(|item| {
                format!(
                    "{:04o} {:<9} {:>12} {} {}",
                    item.mode,
                    format!("{:?}", item.kind).to_lowercase(),
                    item.size,
                    item.cid,
                    item.name
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
