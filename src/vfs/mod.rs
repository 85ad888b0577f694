/*!
 * Virtual File System Module
 * Primitives of the embedded filesystem plus an in-memory implementation
 * with pluggable persistence
 */

pub mod memory;
pub mod persist;
pub mod traits;
pub mod types;

// Re-exports
pub use memory::MemFS;
pub use persist::{DirectoryStore, MemoryStore, PersistentStore, Snapshot, SnapshotEntry};
pub use traits::{SyncCallback, VirtualFs};
pub use types::{FileType, MountOptions, PathAnalysis, PersistenceBackend, VfsError, VfsResult};
