use std::path::{Component, Path};

use crate::dir::{DirError, DirOptions, Directory, Persisted};
use crate::exporter::{self, EntryKind};
use crate::linked_data::{Cid, Link, Metadata};
use crate::store::BlockStore;

use super::MountError;

/// Split an absolute path into its segments, `/` being the
///  empty list. `.` components are dropped; `..` and relative
///  paths are rejected.
pub fn path_segments(path: &Path) -> Result<Vec<String>, MountError> {
    let invalid = || MountError::InvalidPath(path.to_path_buf());
    let mut components = path.components();
    if components.next() != Some(Component::RootDir) {
        return Err(invalid());
    }
    let mut segments = Vec::new();
    for component in components {
        match component {
            Component::Normal(part) => {
                segments.push(part.to_str().ok_or_else(invalid)?.to_string())
            }
            Component::CurDir => continue,
            _ => return Err(invalid()),
        }
    }
    Ok(segments)
}

/// Render segments back into an absolute path for messages
pub fn display_path(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

/// The single change applied to the innermost directory
#[derive(Debug, Clone)]
pub enum Mutation {
    AddLink(Link),
    RemoveLink(String),
    SetMetadata(Metadata),
}

impl Mutation {
    async fn apply<S: BlockStore>(
        self,
        directory: Directory,
        store: &S,
        opts: &DirOptions,
    ) -> Result<(Directory, Persisted), DirError> {
        match self {
            Mutation::AddLink(link) => directory.add_link(store, link, opts).await,
            Mutation::RemoveLink(name) => directory.remove_link(store, &name, opts).await,
            Mutation::SetMetadata(metadata) => directory.set_metadata(store, metadata, opts).await,
        }
    }
}

async fn load_directory<S: BlockStore>(
    store: &S,
    cid: &Cid,
    path: &str,
) -> Result<Option<Directory>, MountError> {
    let entry = exporter::resolve(store, cid, None).await?;
    if entry.kind != EntryKind::Directory {
        return Ok(None);
    }
    tracing::trace!(path, cid = %cid, "descending");
    Ok(Some(entry.directory()?))
}

/// Apply `mutation` to the directory at `segments` under `root`
///  and rewrite every ancestor up to a new root.
///
/// Each directory on the way down is kept on a stack; once the
///  target has been written, the stack is unwound and every
///  parent gets its link to the child replaced with the child's
///  new CID and size. Siblings are never touched.
/// With `parents`, missing segments start out as empty
///  directories and are written along with the rest.
#[tracing::instrument(skip(store, mutation, opts), fields(root = %root))]
pub async fn update_path<S: BlockStore>(
    store: &S,
    root: &Cid,
    segments: &[String],
    mutation: Mutation,
    opts: &DirOptions,
    parents: bool,
) -> Result<Persisted, MountError> {
    let mut current = load_directory(store, root, "/")
        .await?
        .ok_or_else(|| MountError::NotADirectory("/".to_string()))?;

    let mut stack: Vec<(&str, Directory)> = Vec::with_capacity(segments.len());
    for (depth, segment) in segments.iter().enumerate() {
        let path = display_path(&segments[..=depth]);
        let child = match current.get_link(store, segment).await? {
            Some(link) => load_directory(store, link.cid(), &path)
                .await?
                .ok_or(MountError::PathSegmentNotADirectory(path))?,
            None if parents => Directory::empty(Metadata::default()),
            None => return Err(MountError::PathSegmentNotFound(path)),
        };
        stack.push((segment.as_str(), std::mem::replace(&mut current, child)));
    }

    let (_, mut persisted) = mutation.apply(current, store, opts).await?;

    // ancestors always replace the link to the child they hold
    let ancestor_opts = opts.allow_overwriting(true);
    while let Some((name, parent)) = stack.pop() {
        let link = Link::new(name, persisted.cid, persisted.size);
        let (_, written) = parent.add_link(store, link, &ancestor_opts).await?;
        persisted = written;
    }

    tracing::debug!(new_root = %persisted.cid, "path rewritten");
    Ok(persisted)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_segments() {
        assert!(path_segments(Path::new("/")).unwrap().is_empty());
        assert_eq!(
            path_segments(Path::new("/a/./b/")).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(matches!(
            path_segments(Path::new("relative/path")),
            Err(MountError::InvalidPath(_))
        ));
        assert!(matches!(
            path_segments(&PathBuf::from("/a/../b")),
            Err(MountError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(&[]), "/");
        assert_eq!(display_path(&["a".into(), "b".into()]), "/a/b");
    }
}
