use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common::config::Config;
use common::linked_data::Cid;
use common::mount::{Mount, MountError};
use common::store::{BlockStoreError, FsBlockStore};

pub const APP_NAME: &str = "dagfs";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BLOCKS_DIR_NAME: &str = "blocks";
pub const ROOT_FILE_NAME: &str = "root";

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tree settings: CID version, sharding and chunking
    #[serde(default)]
    pub dag: Config,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files, stderr only if not set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dag: Config::default(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::WARN)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,
    #[error("{0} is not initialized, run `dagfs init` first")]
    NotInitialized(PathBuf),
    #[error("{0} is already initialized")]
    AlreadyInitialized(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    SerializeConfig(#[from] toml::ser::Error),
    #[error("invalid root cid {0:?}")]
    InvalidRoot(String),
    #[error("block store error: {0}")]
    BlockStore(#[from] BlockStoreError),
    #[error("mount error: {0}")]
    Mount(#[from] MountError),
}

/// Everything dagfs keeps on disk:
///
/// ```text
/// <dagfs_dir>/
///   config.toml
///   root         current root CID
///   blocks/      the block store
/// ```
#[derive(Debug, Clone)]
pub struct AppState {
    pub dagfs_dir: PathBuf,
    pub blocks_path: PathBuf,
    pub root_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// `custom` if given, `~/.dagfs` otherwise
    pub fn dagfs_dir(custom: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom {
            Some(path) => Ok(path),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{}", APP_NAME)))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    fn at(dagfs_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            blocks_path: dagfs_dir.join(BLOCKS_DIR_NAME),
            root_path: dagfs_dir.join(ROOT_FILE_NAME),
            dagfs_dir,
            config,
        }
    }

    /// Create the state directory with an empty root
    pub async fn init(custom: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let dagfs_dir = Self::dagfs_dir(custom)?;
        let config_path = dagfs_dir.join(CONFIG_FILE_NAME);
        if tokio::fs::try_exists(&config_path).await? {
            return Err(StateError::AlreadyInitialized(dagfs_dir));
        }
        tokio::fs::create_dir_all(&dagfs_dir).await?;
        tokio::fs::write(&config_path, toml::to_string_pretty(&config)?).await?;

        let state = Self::at(dagfs_dir, config);
        let store = state.store().await?;
        let mount = Mount::init(&store, state.config.dag.clone()).await?;
        state.save_root(&mount.root().await).await?;
        tracing::info!(path = %state.dagfs_dir.display(), "initialized");
        Ok(state)
    }

    pub fn load(custom: Option<PathBuf>) -> Result<Self, StateError> {
        let dagfs_dir = Self::dagfs_dir(custom)?;
        let config_path = dagfs_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized(dagfs_dir));
        }
        let config: AppConfig = toml::from_str(&std::fs::read_to_string(&config_path)?)?;
        Ok(Self::at(dagfs_dir, config))
    }

    pub async fn store(&self) -> Result<FsBlockStore, StateError> {
        Ok(FsBlockStore::open(&self.blocks_path).await?)
    }

    pub async fn root(&self) -> Result<Cid, StateError> {
        let root = tokio::fs::read_to_string(&self.root_path).await?;
        let root = root.trim();
        Cid::try_from(root).map_err(|_| StateError::InvalidRoot(root.to_string()))
    }

    /// Swap in a new root. Written to a temp file first so a
    ///  crash never leaves a torn CID behind.
    pub async fn save_root(&self, root: &Cid) -> Result<(), StateError> {
        let tmp = self.root_path.with_extension("tmp");
        tokio::fs::write(&tmp, format!("{}\n", root)).await?;
        tokio::fs::rename(&tmp, &self.root_path).await?;
        tracing::debug!(root = %root, "root saved");
        Ok(())
    }

    /// Mount the current root over the local block store
    pub async fn mount(&self) -> Result<Mount<FsBlockStore>, StateError> {
        let store = self.store().await?;
        let root = self.root().await?;
        Ok(Mount::load(&root, &store, self.config.dag.clone()).await?)
    }

    pub fn dir(&self) -> &Path {
        &self.dagfs_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state");

        let state = AppState::init(Some(path.clone()), AppConfig::default())
            .await
            .unwrap();
        assert_eq!(
            state.root().await.unwrap().to_string(),
            "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn"
        );

        let loaded = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.dir(), path.as_path());

        assert!(matches!(
            AppState::init(Some(path), AppConfig::default()).await,
            Err(StateError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [dag]
            cid_version = 1
            shard_split_threshold_bytes = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert_eq!(config.dag.shard_split_threshold_bytes, 1000);
        assert_eq!(config.dag.shard_fanout, 256);
    }
}
