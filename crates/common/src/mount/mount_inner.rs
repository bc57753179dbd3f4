use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::dir::{DirError, Directory};
use crate::exporter::{self, Entry, EntryKind, ExportError};
use crate::importer::{self, ImportError};
use crate::linked_data::{
    Block, Cid, CodecError, DataType, Link, Metadata, Mtime, PbNode, UnixFs, DAG_PB_CODEC,
};
use crate::store::{BlockStore, BlockStoreError};

use super::mode::parse_mode;
use super::options::{AddOptions, CatOptions, CpOptions, MkdirOptions, RmOptions};
use super::path::{display_path, path_segments, update_path, Mutation};
use super::projection::cid_to_link;
use super::stat::{mode_or_default, LsEntry, Stat};

#[derive(Debug, Clone)]
struct MountInner {
    // CID of the current root directory
    root: Cid,
    config: Config,
}

#[derive(Clone)]
pub struct Mount<S: BlockStore>(Arc<Mutex<MountInner>>, S);

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("path segment not found: {0}")]
    PathSegmentNotFound(String),
    #[error("path segment is not a directory: {0}")]
    PathSegmentNotADirectory(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0} is a directory, remove it recursively")]
    IsADirectory(String),
    #[error("cannot move '{from}' to '{to}': destination is inside source")]
    MoveIntoSelf { from: PathBuf, to: PathBuf },
    #[error("invalid mode: {0}")]
    InvalidMode(String),
    #[error("directory error: {0}")]
    Directory(DirError),
    #[error("export error: {0}")]
    Export(ExportError),
    #[error("import error: {0}")]
    Import(#[from] ImportError),
    #[error("block store error: {0}")]
    BlockStore(#[from] BlockStoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<DirError> for MountError {
    fn from(e: DirError) -> Self {
        match e {
            DirError::AlreadyExists(name) => MountError::AlreadyExists(name),
            DirError::NotFound(name) => MountError::NotFound(name),
            DirError::InvalidName(name) => MountError::InvalidName(name),
            DirError::NotADirectory(cid) => MountError::NotADirectory(cid.to_string()),
            e => MountError::Directory(e),
        }
    }
}

impl From<ExportError> for MountError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::NotFound(cid) => MountError::NotFound(cid.to_string()),
            ExportError::PathNotFound { path, .. } => MountError::NotFound(path),
            ExportError::NotADirectory { path, .. } => MountError::NotADirectory(path),
            ExportError::NotAFile(path) => MountError::NotAFile(path),
            ExportError::Directory(e) => e.into(),
            e => MountError::Export(e),
        }
    }
}

/// Split off the last segment, which names the link to change
///  inside its parent directory
fn split_target<'a>(
    path: &Path,
    segments: &'a [String],
) -> Result<(&'a str, &'a [String]), MountError> {
    match segments.split_last() {
        Some((name, parent)) => Ok((name.as_str(), parent)),
        None => Err(MountError::InvalidPath(path.to_path_buf())),
    }
}

fn relative(segments: &[String]) -> String {
    segments.join("/")
}

impl<S: BlockStore> Mount<S> {
    pub fn store(&self) -> S {
        self.1.clone()
    }

    pub async fn root(&self) -> Cid {
        self.0.lock().await.root
    }

    /// Start a new tree from an empty root directory
    pub async fn init(store: &S, config: Config) -> Result<Self, MountError> {
        let (_, root) =
            Directory::create(store, [], Metadata::default(), &config.dir_options()).await?;
        tracing::debug!(root = %root.cid, "initialized empty root");
        Ok(Self::new(root.cid, store, config))
    }

    /// Mount an existing tree. The root must be a directory.
    pub async fn load(root: &Cid, store: &S, config: Config) -> Result<Self, MountError> {
        let entry = exporter::resolve(store, root, None).await?;
        if entry.kind != EntryKind::Directory {
            return Err(MountError::NotADirectory(root.to_string()));
        }
        Ok(Self::new(*root, store, config))
    }

    fn new(root: Cid, store: &S, config: Config) -> Self {
        Self(
            Arc::new(Mutex::new(MountInner { root, config })),
            store.clone(),
        )
    }

    /// Apply a single mutation under the directory at `segments`
    ///  and swap in the new root
    async fn apply(
        &self,
        inner: &mut MountInner,
        segments: &[String],
        mutation: Mutation,
        force: bool,
        parents: bool,
    ) -> Result<Cid, MountError> {
        let opts = inner.config.dir_options().allow_overwriting(force);
        let persisted =
            update_path(&self.1, &inner.root, segments, mutation, &opts, parents).await?;
        tracing::debug!(old = %inner.root, new = %persisted.cid, "root updated");
        inner.root = persisted.cid;
        Ok(persisted.cid)
    }

    /// Resolve `segments` under `root`. A missing last segment is
    ///  `NotFound`; anything going wrong earlier on the way names
    ///  the segment at fault.
    async fn entry_at(&self, root: &Cid, segments: &[String]) -> Result<Entry, MountError> {
        let prefix = |end: usize| display_path(segments.get(..end).unwrap_or(segments));
        match exporter::resolve(&self.1, root, Some(&relative(segments))).await {
            Ok(entry) => Ok(entry),
            Err(ExportError::PathNotFound { depth, .. }) if depth + 1 >= segments.len() => {
                Err(MountError::NotFound(display_path(segments)))
            }
            Err(ExportError::PathNotFound { depth, .. }) => {
                Err(MountError::PathSegmentNotFound(prefix(depth + 1)))
            }
            Err(ExportError::NotADirectory { depth, .. }) => {
                Err(MountError::PathSegmentNotADirectory(prefix(depth)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn add<R>(&mut self, path: &Path, data: R) -> Result<Cid, MountError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.add_with(path, data, AddOptions::default()).await
    }

    /// Import `data` as a file and link it at `path`
    #[tracing::instrument(skip(self, data))]
    pub async fn add_with<R>(
        &mut self,
        path: &Path,
        data: R,
        options: AddOptions,
    ) -> Result<Cid, MountError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let segments = path_segments(path)?;
        let (name, parent) = split_target(path, &segments)?;

        let mut inner = self.0.lock().await;
        let mut import_options = inner.config.import_options(Metadata {
            mode: options.mode,
            mtime: options.mtime,
        });
        if let Some(raw_leaves) = options.raw_leaves {
            import_options.raw_leaves = raw_leaves;
        }
        let imported = importer::import(&self.1, data, &import_options).await?;
        let link = Link::new(name, imported.cid, imported.size);
        self.apply(
            &mut inner,
            parent,
            Mutation::AddLink(link),
            options.force,
            options.parents,
        )
        .await
    }

    pub async fn mkdir(&mut self, path: &Path) -> Result<Cid, MountError> {
        self.mkdir_with(path, MkdirOptions::default()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn mkdir_with(
        &mut self,
        path: &Path,
        options: MkdirOptions,
    ) -> Result<Cid, MountError> {
        let segments = path_segments(path)?;
        let mut inner = self.0.lock().await;
        if segments.is_empty() {
            // the root always exists
            if options.parents {
                return Ok(inner.root);
            }
            return Err(MountError::AlreadyExists(display_path(&segments)));
        }
        let (name, parent) = split_target(path, &segments)?;

        match self.entry_at(&inner.root, &segments).await {
            Ok(entry) if options.parents && entry.kind == EntryKind::Directory => {
                return Ok(inner.root)
            }
            Ok(_) => return Err(MountError::AlreadyExists(display_path(&segments))),
            Err(MountError::NotFound(_)) => {}
            Err(MountError::PathSegmentNotFound(_)) if options.parents => {}
            Err(e) => return Err(e),
        }

        let metadata = Metadata {
            mode: options.mode,
            mtime: options.mtime,
        };
        let opts = inner.config.dir_options();
        let (_, directory) = Directory::create(&self.1, [], metadata, &opts).await?;
        let link = Link::new(name, directory.cid, directory.size);
        self.apply(&mut inner, parent, Mutation::AddLink(link), false, options.parents)
            .await
    }

    /// Copy the node at `from` to `to`. Only the link is new;
    ///  the copied subtree is shared with the source.
    #[tracing::instrument(skip(self))]
    pub async fn cp(
        &mut self,
        from: &Path,
        to: &Path,
        options: CpOptions,
    ) -> Result<Cid, MountError> {
        let from_segments = path_segments(from)?;
        let mut inner = self.0.lock().await;
        let source = self.entry_at(&inner.root, &from_segments).await?;
        self.link_cid(&mut inner, &source.cid, to, options).await
    }

    /// Link an existing CID from the block store at `to`
    #[tracing::instrument(skip(self))]
    pub async fn cp_cid(
        &mut self,
        cid: &Cid,
        to: &Path,
        options: CpOptions,
    ) -> Result<Cid, MountError> {
        let mut inner = self.0.lock().await;
        self.link_cid(&mut inner, cid, to, options).await
    }

    async fn link_cid(
        &self,
        inner: &mut MountInner,
        cid: &Cid,
        to: &Path,
        options: CpOptions,
    ) -> Result<Cid, MountError> {
        let segments = path_segments(to)?;
        let (name, parent) = split_target(to, &segments)?;
        let link = cid_to_link(&self.1, cid, name).await?;
        self.apply(inner, parent, Mutation::AddLink(link), options.force, options.parents)
            .await
    }

    pub async fn rm(&mut self, path: &Path) -> Result<Cid, MountError> {
        self.rm_with(path, RmOptions::default()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn rm_with(&mut self, path: &Path, options: RmOptions) -> Result<Cid, MountError> {
        let segments = path_segments(path)?;
        if segments.is_empty() {
            return Err(MountError::Default(anyhow::anyhow!("Cannot remove root")));
        }
        let (name, parent) = split_target(path, &segments)?;

        let mut inner = self.0.lock().await;
        let entry = self.entry_at(&inner.root, &segments).await?;
        if entry.kind == EntryKind::Directory && !options.recursive {
            return Err(MountError::IsADirectory(display_path(&segments)));
        }
        self.apply(
            &mut inner,
            parent,
            Mutation::RemoveLink(name.to_string()),
            false,
            false,
        )
        .await
    }

    /// Move `from` to `to`, which must not exist yet and must
    ///  not be inside `from`
    #[tracing::instrument(skip(self))]
    pub async fn mv(&mut self, from: &Path, to: &Path) -> Result<Cid, MountError> {
        let from_segments = path_segments(from)?;
        let to_segments = path_segments(to)?;
        if from_segments.is_empty() {
            return Err(MountError::Default(anyhow::anyhow!("Cannot move root")));
        }
        if to_segments.starts_with(&from_segments) {
            return Err(MountError::MoveIntoSelf {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }
        let (from_name, from_parent) = split_target(from, &from_segments)?;
        let (to_name, to_parent) = split_target(to, &to_segments)?;

        let mut inner = self.0.lock().await;
        let source = self.entry_at(&inner.root, &from_segments).await?;
        match self.entry_at(&inner.root, &to_segments).await {
            Ok(_) => return Err(MountError::AlreadyExists(display_path(&to_segments))),
            Err(MountError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        // both halves are written against a scratch root; the mount
        //  only moves once the source link is gone too
        let opts = inner.config.dir_options();
        let link = Link::new(to_name, source.cid, source.cumulative_size);
        let linked = update_path(
            &self.1,
            &inner.root,
            to_parent,
            Mutation::AddLink(link),
            &opts,
            false,
        )
        .await?;
        let moved = update_path(
            &self.1,
            &linked.cid,
            from_parent,
            Mutation::RemoveLink(from_name.to_string()),
            &opts,
            false,
        )
        .await?;
        tracing::debug!(old = %inner.root, new = %moved.cid, "root updated");
        inner.root = moved.cid;
        Ok(moved.cid)
    }

    /// Change the mode of a file or directory, see [`parse_mode`]
    #[tracing::instrument(skip(self))]
    pub async fn chmod(&mut self, path: &Path, mode: &str) -> Result<Cid, MountError> {
        let segments = path_segments(path)?;
        let mut inner = self.0.lock().await;
        let entry = self.entry_at(&inner.root, &segments).await?;
        let mode = parse_mode(
            mode,
            mode_or_default(&entry),
            entry.kind == EntryKind::Directory,
        )?;
        let metadata = Metadata {
            mode: Some(mode),
            ..entry.metadata
        };
        self.set_metadata(&mut inner, &segments, &entry, metadata)
            .await
    }

    /// Set the modification time of `path`, creating an empty
    ///  file if nothing is there yet
    #[tracing::instrument(skip(self))]
    pub async fn touch(&mut self, path: &Path, mtime: Option<Mtime>) -> Result<Cid, MountError> {
        let segments = path_segments(path)?;
        let mtime = mtime.unwrap_or_else(Mtime::now);
        let mut inner = self.0.lock().await;
        match self.entry_at(&inner.root, &segments).await {
            Ok(entry) => {
                let metadata = Metadata {
                    mtime: Some(mtime),
                    ..entry.metadata
                };
                self.set_metadata(&mut inner, &segments, &entry, metadata)
                    .await
            }
            Err(MountError::NotFound(_)) => {
                let (name, parent) = split_target(path, &segments)?;
                let import_options = inner.config.import_options(Metadata {
                    mode: None,
                    mtime: Some(mtime),
                });
                let imported =
                    importer::import(&self.1, tokio::io::empty(), &import_options).await?;
                let link = Link::new(name, imported.cid, imported.size);
                self.apply(&mut inner, parent, Mutation::AddLink(link), false, false)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Rewrite the node at `segments` with new metadata. Directories
    ///  are rewritten in place; files get a new root node sharing
    ///  the old children.
    async fn set_metadata(
        &self,
        inner: &mut MountInner,
        segments: &[String],
        entry: &Entry,
        metadata: Metadata,
    ) -> Result<Cid, MountError> {
        if entry.kind == EntryKind::Directory {
            return self
                .apply(inner, segments, Mutation::SetMetadata(metadata), true, false)
                .await;
        }

        let (node, mut unixfs) = match &entry.block {
            Block::DagPb { node, unixfs } => (node.clone(), unixfs.clone()),
            // raw leaves can't carry metadata, wrap them in a file node
            Block::Raw(bytes) => {
                let mut unixfs = UnixFs::new(DataType::File);
                unixfs.filesize = Some(bytes.len() as u64);
                unixfs.data = Some(bytes.to_vec());
                (
                    PbNode {
                        data: None,
                        links: vec![],
                    },
                    unixfs,
                )
            }
        };
        unixfs.set_metadata(&metadata);
        let node = PbNode {
            data: Some(unixfs.to_bytes()),
            links: node.links,
        };
        let bytes = node.to_bytes();
        let links_size: u64 = node.links.iter().map(|link| link.tsize()).sum();
        let size = bytes.len() as u64 + links_size;
        let cid = self
            .1
            .put_block(inner.config.cid_version, DAG_PB_CODEC, bytes)
            .await?;

        let (name, parent) = match segments.split_last() {
            Some((name, parent)) => (name, parent),
            None => return Err(MountError::NotADirectory(display_path(segments))),
        };
        let link = Link::new(name.as_str(), cid, size);
        self.apply(inner, parent, Mutation::AddLink(link), true, false)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stat(&self, path: &Path) -> Result<Stat, MountError> {
        let segments = path_segments(path)?;
        let root = self.root().await;
        let entry = self.entry_at(&root, &segments).await?;
        Ok(Stat::from(&entry))
    }

    /// List a directory in its own order. Listing a file yields
    ///  just that file.
    #[tracing::instrument(skip(self))]
    pub async fn ls(&self, path: &Path) -> Result<Vec<LsEntry>, MountError> {
        let segments = path_segments(path)?;
        let root = self.root().await;
        let entry = self.entry_at(&root, &segments).await?;
        if entry.kind != EntryKind::Directory {
            let name = segments.last().cloned().unwrap_or_default();
            return Ok(vec![LsEntry::new(name, &entry, entry.cumulative_size)]);
        }

        let directory = entry.directory()?;
        let mut links = directory.links(&self.1);
        let mut items = Vec::new();
        while let Some(link) = links.try_next().await? {
            let child = exporter::resolve(&self.1, link.cid(), None).await?;
            items.push(LsEntry::new(link.name(), &child, link.size()));
        }
        Ok(items)
    }

    pub async fn cat(&self, path: &Path) -> Result<Vec<u8>, MountError> {
        self.cat_with(path, CatOptions::default()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cat_with(
        &self,
        path: &Path,
        options: CatOptions,
    ) -> Result<Vec<u8>, MountError> {
        let segments = path_segments(path)?;
        let root = self.root().await;
        let entry = self.entry_at(&root, &segments).await?;
        if entry.kind == EntryKind::Directory {
            return Err(MountError::NotAFile(display_path(&segments)));
        }
        Ok(exporter::read(&self.1, &entry, options.offset, options.length).await?)
    }
}
