mod cli;
mod logging;
mod state;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Add, Cat, Chmod, Cp, Init, Ls, Mkdir, Mv, Rm, Root, Stat, Touch};

command_enum! {
    (Init, Init),
    (Add, Add),
    (Cat, Cat),
    (Ls, Ls),
    (Stat, Stat),
    (Mkdir, Mkdir),
    (Cp, Cp),
    (Mv, Mv),
    (Rm, Rm),
    (Chmod, Chmod),
    (Touch, Touch),
    (Root, Root),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // logging settings come from config.toml when there is one
    let config = state::AppState::load(args.config_path.clone())
        .map(|state| state.config)
        .unwrap_or_default();
    let guards = logging::init_logging(config.log_level(), config.log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            // exit skips destructors, flush logs first
            drop(guards);
            std::process::exit(1);
        }
    }
}
