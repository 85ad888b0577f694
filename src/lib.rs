/*!
 * Beekeeper Filesystem Library
 * Durable storage roots on an embedded virtual filesystem
 */

pub mod core;
pub mod monitoring;
pub mod storage;
pub mod vfs;

// Re-exports
pub use monitoring::{init_tracing, OperationSpan};
pub use storage::{
    ensure_create_dir, validate, FsOperation, HostEnvironment, MountBinding, RootPath,
    StorageConfig, StorageError, StorageManager, StorageResult,
};
pub use vfs::{
    DirectoryStore, FileType, MemFS, MemoryStore, MountOptions, PathAnalysis, PersistenceBackend,
    PersistentStore, VfsError, VfsResult, VirtualFs,
};
