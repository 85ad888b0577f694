/*!
 * Persistence Round Trip Tests
 * Restart behaviour of StorageManager over MemFS with real stores
 */

use beekeeper_fs::{
    DirectoryStore, FileType, HostEnvironment, MemFS, MemoryStore, PersistenceBackend,
    PersistentStore, StorageManager, VirtualFs,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn web_manager(store: &MemoryStore) -> (MemFS, StorageManager) {
    let fs = MemFS::new().with_store(PersistenceBackend::IndexedDb, Arc::new(store.clone()));
    let manager = StorageManager::new(Arc::new(fs.clone()), HostEnvironment::Web);
    (fs, manager)
}

fn native_manager(state_dir: &TempDir) -> (MemFS, StorageManager) {
    let store = Arc::new(DirectoryStore::new(state_dir.path()));
    let fs = MemFS::new().with_persistent_root(PersistenceBackend::LocalDirectory, store);
    let manager = StorageManager::new(Arc::new(fs.clone()), HostEnvironment::Native);
    (fs, manager)
}

#[tokio::test]
async fn test_web_restart_resumes_committed_state() {
    let store = MemoryStore::new();

    let (fs, manager) = web_manager(&store);
    manager.init("/beekeeper/wallets").await.unwrap();
    fs.write_file("/beekeeper/wallets/alice.json", b"{\"balance\":1}")
        .unwrap();
    manager.sync(false).await.unwrap();
    assert_eq!(store.len(), 1);

    let (fs, manager) = web_manager(&store);
    manager.init("/beekeeper/wallets").await.unwrap();
    assert_eq!(
        fs.read_file("/beekeeper/wallets/alice.json").unwrap(),
        b"{\"balance\":1}".to_vec()
    );
}

#[tokio::test]
async fn test_unflushed_writes_are_lost_on_restart() {
    let store = MemoryStore::new();

    let (fs, manager) = web_manager(&store);
    manager.init("/state").await.unwrap();
    fs.write_file("/state/saved", b"1").unwrap();
    manager.flush().await.unwrap();
    fs.write_file("/state/unsaved", b"2").unwrap();

    let (fs, manager) = web_manager(&store);
    manager.init("/state").await.unwrap();
    assert!(fs.exists("/state/saved"));
    assert!(!fs.exists("/state/unsaved"));
}

#[tokio::test]
async fn test_explicit_populate_discards_memory_changes() {
    let store = MemoryStore::new();
    let (fs, manager) = web_manager(&store);
    manager.init("/state").await.unwrap();
    manager.flush().await.unwrap();

    fs.write_file("/state/scratch", b"x").unwrap();
    manager.sync(true).await.unwrap();
    assert!(!fs.exists("/state/scratch"));
}

#[tokio::test]
async fn test_native_restart_through_directory_store() {
    let state_dir = TempDir::new().unwrap();

    let (fs, manager) = native_manager(&state_dir);
    manager.init("/beekeeper").await.unwrap();
    fs.mkdir("/beekeeper/keys").unwrap();
    fs.write_file("/beekeeper/keys/bob", b"k").unwrap();
    fs.symlink("/beekeeper/keys/bob", "/beekeeper/current").unwrap();
    manager.sync(false).await.unwrap();

    let store = DirectoryStore::new(state_dir.path());
    assert!(store.load("/").unwrap().is_some());

    let (fs, manager) = native_manager(&state_dir);
    manager.init("/beekeeper").await.unwrap();
    assert_eq!(fs.read_file("/beekeeper/keys/bob").unwrap(), b"k".to_vec());
    assert_eq!(fs.read_link("/beekeeper/current").unwrap(), "/beekeeper/keys/bob");
    assert!(manager.mount_binding().is_none());
}

#[tokio::test]
async fn test_symlinked_root_is_not_recreated() {
    let fs = MemFS::new();
    fs.mkdir("/real").unwrap();
    fs.symlink("/real", "/state").unwrap();

    let manager = StorageManager::new(Arc::new(fs.clone()), HostEnvironment::Native);
    manager.init("/state").await.unwrap();

    assert_eq!(
        fs.analyze_path("/state", false).unwrap().file_type,
        Some(FileType::Symlink)
    );
    assert!(fs.analyze_path("/state", true).unwrap().is_dir());
}

#[tokio::test]
async fn test_second_manager_on_same_mount_point_is_busy() {
    let store = MemoryStore::new();
    let (fs, manager) = web_manager(&store);
    manager.init("/state").await.unwrap();

    let other = StorageManager::new(Arc::new(fs.clone()), HostEnvironment::Web);
    let err = other.init("/state").await.unwrap_err();
    assert!(matches!(
        err.vfs_error(),
        Some(beekeeper_fs::VfsError::Busy(_))
    ));
}
