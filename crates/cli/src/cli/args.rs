pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dagfs")]
#[command(about = "Mutable filesystem view over content-addressed UnixFS trees")]
pub struct Args {
    /// Path to the dagfs state directory (defaults to ~/.dagfs)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
