use crate::linked_data::Mtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Create missing parent directories
    pub parents: bool,
    /// Replace an existing entry of the same name
    pub force: bool,
    pub mode: Option<u32>,
    pub mtime: Option<Mtime>,
    /// Override the configured leaf format
    pub raw_leaves: Option<bool>,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            parents: true,
            force: true,
            mode: None,
            mtime: None,
            raw_leaves: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MkdirOptions {
    /// Create missing parents, and succeed if the directory exists
    pub parents: bool,
    pub mode: Option<u32>,
    pub mtime: Option<Mtime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpOptions {
    pub parents: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Required to remove directories
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatOptions {
    pub offset: u64,
    pub length: Option<u64>,
}
