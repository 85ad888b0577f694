/*!
 * Mount/Sync Orchestrator Tests
 * init ordering, sync direction, failure propagation and serialization
 */

use crate::mock_fs::{logging_fs, CallLog, MockFs};
use beekeeper_fs::vfs::SyncCallback;
use beekeeper_fs::{
    FsOperation, HostEnvironment, PathAnalysis, PersistenceBackend, StorageConfig, StorageError,
    StorageManager, VfsError,
};
use mockall::Sequence;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_web_init_order() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &[]);
    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);

    manager.init("/state").await.unwrap();

    assert_eq!(
        log.calls(),
        vec![
            "analyze /state follow=false",
            "mkdir /state",
            "mount indexed_db /state options=0",
            "syncfs populate=true",
        ]
    );
    assert!(manager.is_initialized());
}

#[tokio::test]
async fn test_sync_after_init_only_flushes() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &[]);
    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);

    manager.init("/state").await.unwrap();
    let after_init = log.calls().len();

    manager.sync(false).await.unwrap();

    assert_eq!(log.calls()[after_init..].to_vec(), vec!["syncfs populate=false"]);
    assert_eq!(log.count("mount"), 1);
    assert_eq!(log.count("mkdir"), 1);
}

#[tokio::test]
async fn test_web_init_with_sequence() {
    let mut fs = MockFs::new();
    let mut seq = Sequence::new();

    fs.expect_analyze_path()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|path, _| Ok(PathAnalysis::missing(path)));
    fs.expect_mkdir()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    fs.expect_mount()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|backend, options, _| {
            assert_eq!(backend, PersistenceBackend::IndexedDb);
            assert!(options.is_empty());
            Ok(())
        });
    fs.expect_syncfs()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|populate, callback| {
            assert!(populate);
            callback(None);
        });

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);
    manager.init("/state").await.unwrap();
}

#[tokio::test]
async fn test_native_init_skips_mount() {
    let log = CallLog::new();
    let fs = logging_fs(&log, &["/data"]);
    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Native);

    manager.init("/data/wallets").await.unwrap();

    assert_eq!(log.count("mount"), 0);
    assert_eq!(
        log.calls(),
        vec![
            "analyze /data/wallets follow=false",
            "analyze /data follow=false",
            "analyze /data/wallets follow=false",
            "mkdir /data/wallets",
            "syncfs populate=true",
        ]
    );
    assert!(manager.mount_binding().is_none());
}

#[tokio::test]
async fn test_relative_root_on_web_touches_nothing() {
    let mut fs = MockFs::new();
    fs.expect_analyze_path().times(0);
    fs.expect_mkdir().times(0);
    fs.expect_mount().times(0);
    fs.expect_syncfs().times(0);

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);
    let err = manager.init("wallets/mine").await.unwrap_err();

    assert!(err.is_configuration());
    assert!(!manager.is_initialized());
}

#[tokio::test]
async fn test_mount_failure_aborts_before_sync() {
    let mut fs = MockFs::new();
    fs.expect_analyze_path()
        .returning(|path, _| Ok(PathAnalysis::missing(path)));
    fs.expect_mkdir().returning(|_| Ok(()));
    fs.expect_mount()
        .times(1)
        .returning(|_, _, mount_point| Err(VfsError::Busy(mount_point.to_string())));
    fs.expect_syncfs().times(0);

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);
    let err = manager.init("/state").await.unwrap_err();

    match err {
        StorageError::FilesystemOperation {
            operation,
            path,
            source,
        } => {
            assert_eq!(operation, FsOperation::Mount);
            assert_eq!(path, "/state");
            assert_eq!(source, VfsError::Busy("/state".to_string()));
        }
        other => panic!("expected FilesystemOperation, got {:?}", other),
    }
    assert!(manager.mount_binding().is_none());
}

#[tokio::test]
async fn test_sync_error_passes_underlying_error_through() {
    let mut fs = MockFs::new();
    fs.expect_analyze_path()
        .returning(|path, _| Ok(PathAnalysis::missing(path)));
    fs.expect_mkdir().returning(|_| Ok(()));
    fs.expect_mount().returning(|_, _, _| Ok(()));
    fs.expect_syncfs().returning(|populate, callback| {
        if populate {
            callback(None);
        } else {
            callback(Some(VfsError::IoError("quota exceeded".to_string())));
        }
    });

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);
    manager.init("/state").await.unwrap();

    let err = manager.sync(false).await.unwrap_err();
    assert_eq!(err.operation(), Some(FsOperation::Flush));
    assert_eq!(
        err.vfs_error(),
        Some(&VfsError::IoError("quota exceeded".to_string()))
    );
    assert!(err.to_string().contains("/state"));
}

#[tokio::test]
async fn test_populate_failure_leaves_manager_uninitialized() {
    let mut fs = MockFs::new();
    fs.expect_analyze_path()
        .returning(|path, _| Ok(PathAnalysis::missing(path)));
    fs.expect_mkdir().returning(|_| Ok(()));
    fs.expect_mount().times(1).returning(|_, _, _| Ok(()));
    fs.expect_syncfs().returning(|_, callback| {
        callback(Some(VfsError::Serialization("corrupt snapshot".to_string())))
    });

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Web);
    let err = manager.init("/state").await.unwrap_err();

    assert_eq!(err.operation(), Some(FsOperation::Populate));
    assert!(!manager.is_initialized());

    // Retrying keeps the existing binding instead of mounting twice
    let err = manager.init("/state").await.unwrap_err();
    assert_eq!(err.operation(), Some(FsOperation::Populate));
    assert!(manager.mount_binding().is_some());
}

#[tokio::test]
async fn test_dropped_callback_is_reported() {
    let mut fs = MockFs::new();
    fs.expect_syncfs().returning(|_, callback| drop(callback));

    let manager = StorageManager::new(Arc::new(fs), HostEnvironment::Native);
    let err = manager.sync(false).await.unwrap_err();

    assert_eq!(
        err,
        StorageError::SyncInterrupted {
            operation: FsOperation::Flush
        }
    );
}

#[tokio::test]
async fn test_hung_sync_times_out() {
    let parked: Arc<Mutex<Vec<SyncCallback>>> = Arc::new(Mutex::new(Vec::new()));
    let parked_in_mock = Arc::clone(&parked);

    let mut fs = MockFs::new();
    fs.expect_syncfs()
        .returning(move |_, callback| parked_in_mock.lock().push(callback));

    let config = StorageConfig::native("/state").with_sync_timeout(Duration::from_millis(20));
    let manager = StorageManager::with_config(Arc::new(fs), config);

    let err = manager.sync(true).await.unwrap_err();
    assert_eq!(
        err,
        StorageError::Timeout {
            operation: FsOperation::Populate,
            timeout: Duration::from_millis(20),
        }
    );
    assert_eq!(parked.lock().len(), 1);
}

#[tokio::test]
async fn test_concurrent_syncs_are_serialized() {
    let parked: Arc<Mutex<Vec<SyncCallback>>> = Arc::new(Mutex::new(Vec::new()));
    let parked_in_mock = Arc::clone(&parked);

    let mut fs = MockFs::new();
    fs.expect_syncfs()
        .returning(move |_, callback| parked_in_mock.lock().push(callback));

    let manager = Arc::new(StorageManager::new(Arc::new(fs), HostEnvironment::Native));

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.sync(false).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.sync(false).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Second caller is waiting on the operation lock, not inside syncfs
    assert_eq!(parked.lock().len(), 1);

    let callback = parked.lock().remove(0);
    callback(None);
    first.await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(parked.lock().len(), 1);

    let callback = parked.lock().remove(0);
    callback(None);
    second.await.unwrap().unwrap();
}
