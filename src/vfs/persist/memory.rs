/*!
 * In-Memory Persistence Store
 * Shared snapshot map that outlives any single filesystem instance
 */

use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

use super::{PersistentStore, Snapshot};
use crate::vfs::types::VfsResult;

/// Process-local store
///
/// Clones share the same map, so a fresh `MemFS` handed a clone sees what an
/// earlier instance flushed. Stands in for browser indexed storage in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: Arc<DashMap<String, Snapshot, RandomState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Number of mount points with a stored snapshot
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn load(&self, key: &str) -> VfsResult<Option<Snapshot>> {
        Ok(self.snapshots.get(key).map(|s| s.value().clone()))
    }

    fn store(&self, key: &str, snapshot: &Snapshot) -> VfsResult<()> {
        self.snapshots.insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
