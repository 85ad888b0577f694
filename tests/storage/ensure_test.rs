/*!
 * Directory Ensurer Tests
 * Call ordering against a mock filesystem and idempotence against MemFS
 */

use crate::mock_fs::{logging_fs, CallLog, MockFs};
use beekeeper_fs::{
    ensure_create_dir, FsOperation, HostEnvironment, MemFS, PathAnalysis, StorageManager,
    VfsError, VirtualFs,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use mockall::Sequence;
use pretty_assertions::assert_eq;

#[test]
fn test_three_levels_created_ancestors_first() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &[]);

    ensure_create_dir(&fs, &["a", "b", "c"], true).unwrap();

    let mkdirs: Vec<String> = log
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("mkdir"))
        .collect();
    assert_eq!(mkdirs, vec!["mkdir /a", "mkdir /a/b", "mkdir /a/b/c"]);
}

#[test]
fn test_analysis_never_follows_links() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &[]);

    ensure_create_dir(&fs, &["a", "b"], true).unwrap();

    assert_eq!(
        log.calls(),
        vec![
            "analyze /a/b follow=false",
            "analyze /a follow=false",
            "mkdir /a",
            "analyze /a/b follow=false",
            "mkdir /a/b",
        ]
    );
}

#[test]
fn test_existing_prefix_is_not_recreated() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &["/a", "/a/b"]);

    ensure_create_dir(&fs, &["a", "b", "c"], true).unwrap();

    assert_eq!(log.count("mkdir"), 1);
    assert_eq!(log.calls().last().map(String::as_str), Some("mkdir /a/b/c"));
}

#[test]
fn test_existing_root_issues_no_mkdir() {
    let mut fs = MockFs::new();
    let mut seq = Sequence::new();

    fs.expect_analyze_path()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|path, _| {
            Ok(PathAnalysis::found(path, beekeeper_fs::vfs::FileType::Directory))
        });
    fs.expect_mkdir().times(0);

    ensure_create_dir(&fs, &["state"], true).unwrap();
}

#[test]
fn test_relative_segments_stay_relative() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &[]);

    ensure_create_dir(&fs, &["wallets", "mine"], false).unwrap();

    assert_eq!(log.count("mkdir wallets"), 2);
    assert!(log.calls().contains(&"mkdir wallets/mine".to_string()));
}

#[test]
fn test_analysis_failure_names_operation_and_path() {
    let mut fs = MockFs::new();
    fs.expect_analyze_path()
        .returning(|_, _| Err(VfsError::IoError("backend offline".to_string())));
    fs.expect_mkdir().times(0);

    let err = ensure_create_dir(&fs, &["a", "b"], true).unwrap_err();
    assert_eq!(err.operation(), Some(FsOperation::Analyze));
    assert_eq!(
        err.to_string(),
        "Failed to analyze path at /a/b: I/O error: backend offline"
    );
}

#[test]
fn test_mkdir_failure_stops_the_chain() {
    let log = CallLog::new();
    let mut fs = MockFs::new();

    fs.expect_analyze_path()
        .returning(|path, _| Ok(PathAnalysis::missing(path)));
    let mkdir_log = log.clone();
    fs.expect_mkdir().returning(move |path| {
        mkdir_log.push(format!("mkdir {}", path));
        if path == "/a/b" {
            Err(VfsError::NotSupported("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    });

    let err = ensure_create_dir(&fs, &["a", "b", "c"], true).unwrap_err();

    assert_eq!(err.operation(), Some(FsOperation::Mkdir));
    assert!(err.to_string().contains("/a/b"));
    assert_eq!(log.calls(), vec!["mkdir /a", "mkdir /a/b"]);
}

#[test]
fn test_idempotent_against_memfs() {
    let fs = MemFS::new();

    ensure_create_dir(&fs, &["a", "b", "c"], true).unwrap();
    ensure_create_dir(&fs, &["a", "b", "c"], true).unwrap();

    assert_eq!(fs.read_dir("/").unwrap(), vec!["a".to_string()]);
    assert_eq!(fs.read_dir("/a").unwrap(), vec!["b".to_string()]);
    assert_eq!(fs.read_dir("/a/b").unwrap(), vec!["c".to_string()]);
    assert!(fs.analyze_path("/a/b/c", false).unwrap().is_dir());
}

#[test]
fn test_partial_chain_is_completed_on_retry() {
    let fs = MemFS::new();
    fs.mkdir("/a").unwrap();

    ensure_create_dir(&fs, &["a", "b"], true).unwrap();
    assert!(fs.exists("/a/b"));
}

#[test]
fn test_target_created_during_parent_pass_is_not_recreated() {
    let fs = MemFS::new();

    ensure_create_dir(&fs, &["a", "b", "..", "b"], true).unwrap();
    ensure_create_dir(&fs, &["a", "b", "..", "b"], true).unwrap();

    assert_eq!(fs.read_dir("/").unwrap(), vec!["a".to_string()]);
    assert_eq!(fs.read_dir("/a").unwrap(), vec!["b".to_string()]);
    assert!(fs.read_dir("/a/b").unwrap().is_empty());
}

#[test]
fn test_existence_rechecked_after_parent_pass() {
    let mut fs = MockFs::new();
    let analyses = AtomicUsize::new(0);

    // `/a/b` missing, `/a` missing, then `/a/b` present after the parent pass
    fs.expect_analyze_path().times(3).returning(move |path, _| {
        if analyses.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(PathAnalysis::missing(path))
        } else {
            Ok(PathAnalysis::found(path, beekeeper_fs::vfs::FileType::Directory))
        }
    });
    fs.expect_mkdir().times(1).returning(|path| {
        assert_eq!(path, "/a");
        Ok(())
    });

    ensure_create_dir(&fs, &["a", "b"], true).unwrap();
}

#[tokio::test]
async fn test_init_with_dotdot_root() {
    let fs = MemFS::new();
    let manager = StorageManager::new(Arc::new(fs.clone()), HostEnvironment::Native);

    manager.init("/a/b/../b").await.unwrap();
    manager.init("/a/b/../b").await.unwrap();

    assert!(fs.analyze_path("/a/b", false).unwrap().is_dir());
    assert_eq!(fs.read_dir("/a").unwrap(), vec!["b".to_string()]);
}
