//! Filesystem operations over an immutable UnixFS tree
//!
//! A [`Mount`] holds the CID of a root directory and a block store. Every
//! mutation (`add`, `cp`, `rm`, `mkdir`, `mv`, `chmod`, `touch`) produces a
//! new root; blocks reachable from older roots are never rewritten, so any
//! previous root CID stays a valid snapshot.
//!
//! # Architecture
//!
//! ## Path rewriting
//!
//! A mutation at `/a/b/c` loads each directory on the way down, changes a
//! single link in the innermost one and then rewrites the ancestors bottom
//! up ([`update_path`]):
//! ```text
//!   root ---a---> A ---b---> B          root' ---a---> A' ---b---> B'
//!                 |          |     =>                  |           |
//!                 x          c                         x           c'
//! ```
//! `x` is shared between both trees; only the nodes on the path change.
//!
//! ## Directories
//!
//! Directories are stored flat until their estimated size passes the shard
//! threshold, after which they become HAMT shards (see
//! [`Directory`](crate::dir::Directory)). The mount never needs to know
//! which representation a directory uses.
//!
//! ## Concurrency
//!
//! A mount serializes its own mutations behind a mutex held for the whole
//! read-modify-write. Reads snapshot the current root and don't block
//! writers. Two mounts over the same store are not coordinated.

mod mode;
mod mount_inner;
mod options;
mod path;
mod projection;
mod stat;

pub use mode::{parse_mode, DEFAULT_DIRECTORY_MODE, DEFAULT_FILE_MODE};
pub use mount_inner::{Mount, MountError};
pub use options::{AddOptions, CatOptions, CpOptions, MkdirOptions, RmOptions};
pub use path::{path_segments, update_path, Mutation};
pub use projection::cid_to_link;
pub use stat::{LsEntry, Stat};
