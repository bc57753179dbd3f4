//! Integration tests for Mount cp operations

mod common;

use std::io::Cursor;
use std::path::PathBuf;

use ::common::linked_data::{block_cid, CidVersion, RAW_CODEC};
use ::common::mount::{CpOptions, MountError};
use ::common::store::BlockStore;

#[tokio::test]
async fn test_cp_file() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/a.txt"), Cursor::new(b"shared".to_vec()))
        .await
        .unwrap();
    mount
        .cp(
            &PathBuf::from("/a.txt"),
            &PathBuf::from("/b.txt"),
            CpOptions::default(),
        )
        .await
        .unwrap();

    let a = mount.stat(&PathBuf::from("/a.txt")).await.unwrap();
    let b = mount.stat(&PathBuf::from("/b.txt")).await.unwrap();
    assert_eq!(a.cid, b.cid);
    assert_eq!(mount.cat(&PathBuf::from("/b.txt")).await.unwrap(), b"shared");
}

#[tokio::test]
async fn test_cp_directory_with_parents() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/src/deep/file.txt"), Cursor::new(b"x".to_vec()))
        .await
        .unwrap();

    let result = mount
        .cp(
            &PathBuf::from("/src"),
            &PathBuf::from("/backup/2024/src"),
            CpOptions::default(),
        )
        .await;
    assert!(matches!(result, Err(MountError::PathSegmentNotFound(p)) if p == "/backup"));

    mount
        .cp(
            &PathBuf::from("/src"),
            &PathBuf::from("/backup/2024/src"),
            CpOptions {
                parents: true,
                force: false,
            },
        )
        .await
        .unwrap();

    let src = mount.stat(&PathBuf::from("/src")).await.unwrap();
    let copy = mount.stat(&PathBuf::from("/backup/2024/src")).await.unwrap();
    assert_eq!(src.cid, copy.cid);
    assert_eq!(
        mount
            .cat(&PathBuf::from("/backup/2024/src/deep/file.txt"))
            .await
            .unwrap(),
        b"x"
    );
}

#[tokio::test]
async fn test_cp_onto_existing_name() {
    let (mut mount, _, _temp) = common::setup_test_env().await;

    mount
        .add(&PathBuf::from("/a.txt"), Cursor::new(b"a".to_vec()))
        .await
        .unwrap();
    mount
        .add(&PathBuf::from("/b.txt"), Cursor::new(b"b".to_vec()))
        .await
        .unwrap();
    let root = mount.root().await;

    let result = mount
        .cp(
            &PathBuf::from("/a.txt"),
            &PathBuf::from("/b.txt"),
            CpOptions::default(),
        )
        .await;
    assert!(matches!(result, Err(MountError::AlreadyExists(_))));
    assert_eq!(mount.root().await, root);

    mount
        .cp(
            &PathBuf::from("/a.txt"),
            &PathBuf::from("/b.txt"),
            CpOptions {
                parents: false,
                force: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(mount.cat(&PathBuf::from("/b.txt")).await.unwrap(), b"a");
}

#[tokio::test]
async fn test_cp_cid() {
    let (mut mount, store, _temp) = common::setup_test_env().await;

    let cid = store
        .put_block(CidVersion::V1, RAW_CODEC, b"from the store".to_vec())
        .await
        .unwrap();
    mount
        .cp_cid(&cid, &PathBuf::from("/leaf"), CpOptions::default())
        .await
        .unwrap();

    let items = mount.ls(&PathBuf::from("/")).await.unwrap();
    assert_eq!(items[0].cid, cid);
    assert_eq!(items[0].cumulative_size, 14);
    assert_eq!(
        mount.cat(&PathBuf::from("/leaf")).await.unwrap(),
        b"from the store"
    );
}

#[tokio::test]
async fn test_cp_unknown_cid() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let root = mount.root().await;

    let cid = block_cid(CidVersion::V1, RAW_CODEC, b"never stored").unwrap();
    let result = mount
        .cp_cid(&cid, &PathBuf::from("/leaf"), CpOptions::default())
        .await;
    assert!(matches!(result, Err(MountError::NotFound(_))));
    assert_eq!(mount.root().await, root);
}

#[tokio::test]
async fn test_cp_missing_source() {
    let (mut mount, _, _temp) = common::setup_test_env().await;
    let result = mount
        .cp(
            &PathBuf::from("/nope"),
            &PathBuf::from("/copy"),
            CpOptions::default(),
        )
        .await;
    assert!(matches!(result, Err(MountError::NotFound(_))));
}
