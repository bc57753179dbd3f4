//! Integration tests for chmod, touch and stat

mod common;

use std::io::Cursor;
use std::path::PathBuf;

use ::common::exporter::EntryKind;
use ::common::linked_data::Mtime;
use ::common::mount::{AddOptions, MountError};

#[tokio::test]
async fn test_chmod_octal_and_symbolic() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/run.sh"), Cursor::new(b"#!/bin/sh".to_vec()))
        .await
        .unwrap();
    assert_eq!(mount.stat(&PathBuf::from("/run.sh")).await.unwrap().mode, 0o644);

    mount.chmod(&PathBuf::from("/run.sh"), "u+x").await.unwrap();
    assert_eq!(mount.stat(&PathBuf::from("/run.sh")).await.unwrap().mode, 0o744);

    mount.chmod(&PathBuf::from("/run.sh"), "0600").await.unwrap();
    let stat = mount.stat(&PathBuf::from("/run.sh")).await.unwrap();
    assert_eq!(stat.mode, 0o600);
    assert_eq!(stat.size, 9);

    // content is untouched by metadata changes
    assert_eq!(
        mount.cat(&PathBuf::from("/run.sh")).await.unwrap(),
        b"#!/bin/sh"
    );
}

#[tokio::test]
async fn test_chmod_wraps_raw_leaf() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add_with(
            &PathBuf::from("/leaf.bin"),
            Cursor::new(b"raw bytes".to_vec()),
            AddOptions {
                raw_leaves: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let before = mount.stat(&PathBuf::from("/leaf.bin")).await.unwrap();
    assert_eq!(before.kind, EntryKind::Raw);

    mount.chmod(&PathBuf::from("/leaf.bin"), "640").await.unwrap();

    let after = mount.stat(&PathBuf::from("/leaf.bin")).await.unwrap();
    assert_eq!(after.kind, EntryKind::File);
    assert_eq!(after.mode, 0o640);
    assert_eq!(after.size, 9);
    assert_ne!(after.cid, before.cid);
    assert_eq!(
        mount.cat(&PathBuf::from("/leaf.bin")).await.unwrap(),
        b"raw bytes"
    );
}

#[tokio::test]
async fn test_chmod_directory_keeps_links() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/dir/a.txt"), Cursor::new(b"a".to_vec()))
        .await
        .unwrap();
    mount.chmod(&PathBuf::from("/dir"), "go-rx").await.unwrap();

    let stat = mount.stat(&PathBuf::from("/dir")).await.unwrap();
    assert_eq!(stat.mode, 0o700);
    assert_eq!(stat.kind, EntryKind::Directory);
    assert_eq!(mount.cat(&PathBuf::from("/dir/a.txt")).await.unwrap(), b"a");
}

#[tokio::test]
async fn test_chmod_invalid_mode() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount.mkdir(&PathBuf::from("/dir")).await.unwrap();
    let root = mount.root().await;

    let result = mount.chmod(&PathBuf::from("/dir"), "q+z").await;
    assert!(matches!(result, Err(MountError::InvalidMode(_))));
    let result = mount.chmod(&PathBuf::from("/missing"), "755").await;
    assert!(matches!(result, Err(MountError::NotFound(_))));
    let result = mount.chmod(&PathBuf::from("/nodir/file.txt"), "755").await;
    assert!(matches!(result, Err(MountError::PathSegmentNotFound(p)) if p == "/nodir"));
    // touch creates files, not their parents
    let result = mount.touch(&PathBuf::from("/nodir/file.txt"), None).await;
    assert!(matches!(result, Err(MountError::PathSegmentNotFound(p)) if p == "/nodir"));
    assert_eq!(mount.root().await, root);
}

#[tokio::test]
async fn test_touch_existing_file() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let mtime = Mtime::new(1_700_000_000, 500);

    mount
        .add_with(
            &PathBuf::from("/notes.txt"),
            Cursor::new(b"notes".to_vec()),
            AddOptions {
                mode: Some(0o600),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    mount
        .touch(&PathBuf::from("/notes.txt"), Some(mtime))
        .await
        .unwrap();

    let stat = mount.stat(&PathBuf::from("/notes.txt")).await.unwrap();
    assert_eq!(stat.mtime, Some(mtime));
    // the mode set on import survives
    assert_eq!(stat.mode, 0o600);
}

#[tokio::test]
async fn test_touch_creates_missing_file() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let mtime = Mtime::new(42, 0);

    mount
        .touch(&PathBuf::from("/empty"), Some(mtime))
        .await
        .unwrap();

    let stat = mount.stat(&PathBuf::from("/empty")).await.unwrap();
    assert_eq!(stat.kind, EntryKind::File);
    assert_eq!(stat.size, 0);
    assert_eq!(stat.mtime, Some(mtime));
    assert!(mount.cat(&PathBuf::from("/empty")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_touch_directory_and_root() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let mtime = Mtime::new(1_000, 0);

    mount
        .add(&PathBuf::from("/dir/keep.txt"), Cursor::new(b"keep".to_vec()))
        .await
        .unwrap();
    mount
        .touch(&PathBuf::from("/dir"), Some(mtime))
        .await
        .unwrap();
    let stat = mount.stat(&PathBuf::from("/dir")).await.unwrap();
    assert_eq!(stat.mtime, Some(mtime));
    assert_eq!(stat.blocks, 1);

    let root = mount.touch(&PathBuf::from("/"), Some(mtime)).await.unwrap();
    let stat = mount.stat(&PathBuf::from("/")).await.unwrap();
    assert_eq!(stat.cid, root);
    assert_eq!(stat.mtime, Some(mtime));
    assert_eq!(
        mount.cat(&PathBuf::from("/dir/keep.txt")).await.unwrap(),
        b"keep"
    );
}

#[tokio::test]
async fn test_touch_without_mtime_uses_now() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount.touch(&PathBuf::from("/now"), None).await.unwrap();
    let stat = mount.stat(&PathBuf::from("/now")).await.unwrap();
    let mtime = stat.mtime.unwrap();
    assert!(mtime.secs > 1_600_000_000);
}
