pub mod add;
pub mod cat;
pub mod chmod;
pub mod cp;
pub mod init;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod rm;
pub mod root;
pub mod stat;
pub mod touch;

pub use add::Add;
pub use cat::Cat;
pub use chmod::Chmod;
pub use cp::Cp;
pub use init::Init;
pub use ls::Ls;
pub use mkdir::Mkdir;
pub use mv::Mv;
pub use rm::Rm;
pub use root::Root;
pub use stat::Stat;
pub use touch::Touch;

use common::mount::MountError;

use crate::state::StateError;

/// Failure of any command that works on the mounted tree
#[derive(Debug, thiserror::Error)]
pub enum TreeOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Format the summary every mutating command prints
pub(crate) fn root_changed(
    action: &str,
    path: &std::path::Path,
    root: &common::linked_data::Cid,
) -> String {
    format!("{} {}\nroot: {}", action, path.display(), root)
}
