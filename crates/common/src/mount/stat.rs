use serde::Serialize;

use crate::exporter::{Entry, EntryKind};
use crate::linked_data::{Cid, Mtime};

use super::mode::{DEFAULT_DIRECTORY_MODE, DEFAULT_FILE_MODE};

/// Everything `stat` reports about a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub cid: Cid,
    pub kind: EntryKind,
    /// Content bytes, zero for directories
    pub size: u64,
    pub cumulative_size: u64,
    /// Links leaving the node
    pub blocks: usize,
    pub mode: u32,
    pub mtime: Option<Mtime>,
    pub sharded: bool,
}

impl From<&Entry> for Stat {
    fn from(entry: &Entry) -> Self {
        Self {
            cid: entry.cid,
            kind: entry.kind,
            size: entry.size,
            cumulative_size: entry.cumulative_size,
            blocks: entry.blocks(),
            mode: mode_or_default(entry),
            mtime: entry.metadata.mtime,
            sharded: entry.is_sharded(),
        }
    }
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LsEntry {
    pub name: String,
    pub cid: Cid,
    pub kind: EntryKind,
    pub size: u64,
    /// The `Tsize` recorded on the parent's link
    pub cumulative_size: u64,
    pub mode: u32,
    pub mtime: Option<Mtime>,
}

impl LsEntry {
    pub(crate) fn new(name: impl Into<String>, entry: &Entry, cumulative_size: u64) -> Self {
        Self {
            name: name.into(),
            cid: entry.cid,
            kind: entry.kind,
            size: entry.size,
            cumulative_size,
            mode: mode_or_default(entry),
            mtime: entry.metadata.mtime,
        }
    }
}

pub(crate) fn mode_or_default(entry: &Entry) -> u32 {
    entry.metadata.mode.unwrap_or(match entry.kind {
        EntryKind::Directory => DEFAULT_DIRECTORY_MODE,
        EntryKind::File | EntryKind::Raw => DEFAULT_FILE_MODE,
    })
}
