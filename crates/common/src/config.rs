use serde::{Deserialize, Serialize};

use crate::dir::DirOptions;
use crate::importer::ImportOptions;
use crate::linked_data::{CidVersion, Metadata};

/// Estimated directory size, in bytes, past which a flat
///  directory is converted to a HAMT shard
pub const DEFAULT_SHARD_SPLIT_THRESHOLD_BYTES: u64 = 262_144;
pub const DEFAULT_SHARD_FANOUT: u64 = 256;
pub const DEFAULT_CHUNK_SIZE: usize = 262_144;
/// Links per file node in the balanced layout
pub const DEFAULT_MAX_CHILDREN: usize = 174;

/// Settings shared by every operation on a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cid_version: CidVersion,
    #[serde(default = "default_shard_split_threshold_bytes")]
    pub shard_split_threshold_bytes: u64,
    #[serde(default = "default_shard_fanout")]
    pub shard_fanout: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub raw_leaves: bool,
    #[serde(default = "default_max_children")]
    pub max_children: usize,
}

fn default_shard_split_threshold_bytes() -> u64 {
    DEFAULT_SHARD_SPLIT_THRESHOLD_BYTES
}

fn default_shard_fanout() -> u64 {
    DEFAULT_SHARD_FANOUT
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_children() -> usize {
    DEFAULT_MAX_CHILDREN
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cid_version: CidVersion::default(),
            shard_split_threshold_bytes: default_shard_split_threshold_bytes(),
            shard_fanout: default_shard_fanout(),
            chunk_size: default_chunk_size(),
            raw_leaves: false,
            max_children: default_max_children(),
        }
    }
}

impl Config {
    pub fn dir_options(&self) -> DirOptions {
        DirOptions {
            cid_version: self.cid_version,
            shard_split_threshold_bytes: self.shard_split_threshold_bytes,
            shard_fanout: self.shard_fanout,
            allow_overwriting: false,
        }
    }

    pub fn import_options(&self, metadata: Metadata) -> ImportOptions {
        ImportOptions {
            cid_version: self.cid_version,
            raw_leaves: self.raw_leaves,
            chunk_size: self.chunk_size,
            max_children: self.max_children,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "cid_version": 1 }"#).unwrap();
        assert_eq!(config.cid_version, CidVersion::V1);
        assert_eq!(config.shard_split_threshold_bytes, 262_144);
        assert_eq!(config.shard_fanout, 256);
        assert_eq!(config.chunk_size, 262_144);
        assert_eq!(config.max_children, 174);
        assert!(!config.raw_leaves);
    }

    #[test]
    fn test_rejects_unknown_cid_version() {
        let result: Result<Config, _> = serde_json::from_str(r#"{ "cid_version": 3 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_dir_options() {
        let config = Config {
            shard_split_threshold_bytes: 1000,
            ..Default::default()
        };
        let opts = config.dir_options();
        assert_eq!(opts.shard_split_threshold_bytes, 1000);
        assert!(!opts.allow_overwriting);
        assert!(opts.allow_overwriting(true).allow_overwriting);
    }
}
