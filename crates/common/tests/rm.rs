//! Integration tests for Mount rm (remove) operations

mod common;

use std::io::Cursor;
use std::path::PathBuf;

use ::common::mount::{MountError, RmOptions};

#[tokio::test]
async fn test_rm() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let empty_root = mount.root().await;

    mount
        .add(&PathBuf::from("/test.txt"), Cursor::new(b"data".to_vec()))
        .await
        .unwrap();

    let items = mount.ls(&PathBuf::from("/")).await.unwrap();
    assert_eq!(items.len(), 1);

    let root = mount.rm(&PathBuf::from("/test.txt")).await.unwrap();

    let items = mount.ls(&PathBuf::from("/")).await.unwrap();
    assert!(items.is_empty());
    // same link set, same CID
    assert_eq!(root, empty_root);
}

#[tokio::test]
async fn test_rm_directory_requires_recursive() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/dir/file.txt"), Cursor::new(b"x".to_vec()))
        .await
        .unwrap();

    let result = mount.rm(&PathBuf::from("/dir")).await;
    assert!(matches!(result, Err(MountError::IsADirectory(p)) if p == "/dir"));

    mount
        .rm_with(&PathBuf::from("/dir"), RmOptions { recursive: true })
        .await
        .unwrap();
    assert!(mount.ls(&PathBuf::from("/")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rm_nested_file() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/a/b/keep.txt"), Cursor::new(b"keep".to_vec()))
        .await
        .unwrap();
    mount
        .add(&PathBuf::from("/a/b/drop.txt"), Cursor::new(b"drop".to_vec()))
        .await
        .unwrap();

    mount.rm(&PathBuf::from("/a/b/drop.txt")).await.unwrap();

    let items = mount.ls(&PathBuf::from("/a/b")).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "keep.txt");
}

#[tokio::test]
async fn test_rm_errors() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let root = mount.root().await;

    let result = mount.rm(&PathBuf::from("/missing.txt")).await;
    assert!(matches!(result, Err(MountError::NotFound(_))));

    let result = mount.rm(&PathBuf::from("/")).await;
    assert!(matches!(result, Err(MountError::Default(_))));

    let result = mount.rm(&PathBuf::from("missing.txt")).await;
    assert!(matches!(result, Err(MountError::InvalidPath(_))));

    assert_eq!(mount.root().await, root);
}

#[tokio::test]
async fn test_old_root_survives_removal() {
    let (mut mount, store, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/file.txt"), Cursor::new(b"still here".to_vec()))
        .await
        .unwrap();
    let before = mount.root().await;
    mount.rm(&PathBuf::from("/file.txt")).await.unwrap();

    let snapshot = ::common::mount::Mount::load(&before, &store, Default::default())
        .await
        .unwrap();
    assert_eq!(
        snapshot.cat(&PathBuf::from("/file.txt")).await.unwrap(),
        b"still here"
    );
}

#[tokio::test]
async fn test_rm_names_the_failing_segment() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    mount
        .add(&PathBuf::from("/f"), Cursor::new(b"f".to_vec()))
        .await
        .unwrap();
    let root = mount.root().await;

    let result = mount.rm(&PathBuf::from("/nodir/file.txt")).await;
    assert!(matches!(result, Err(MountError::PathSegmentNotFound(p)) if p == "/nodir"));

    let result = mount.rm(&PathBuf::from("/f/below")).await;
    assert!(matches!(result, Err(MountError::PathSegmentNotADirectory(p)) if p == "/f"));

    let result = mount.rm(&PathBuf::from("/f/below/deeper")).await;
    assert!(matches!(result, Err(MountError::PathSegmentNotADirectory(p)) if p == "/f"));
    assert_eq!(mount.root().await, root);
}
