/*!
 * Persistence Stores
 * Durable layers a mounted subtree is populated from and flushed to
 */

mod local;
mod memory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::VfsResult;

pub use local::DirectoryStore;
pub use memory::MemoryStore;

/// One persisted node, keyed by its path relative to the mount point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotEntry {
    Directory,
    File(Vec<u8>),
    Symlink(String),
}

/// Full contents of a mounted subtree at sync time
///
/// Keys are relative paths without a leading separator; ordering puts
/// parents before their children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rel_path: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(rel_path.into(), entry);
    }

    pub fn get(&self, rel_path: &str) -> Option<&SnapshotEntry> {
        self.entries.get(rel_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SnapshotEntry)> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Durable storage for snapshots
///
/// `key` identifies the mounted subtree (its absolute mount point). A store
/// that has never seen a key reports `None` rather than an empty snapshot so
/// first boot can be told apart from an emptied tree.
pub trait PersistentStore: Send + Sync {
    fn load(&self, key: &str) -> VfsResult<Option<Snapshot>>;

    fn store(&self, key: &str, snapshot: &Snapshot) -> VfsResult<()>;

    fn name(&self) -> &str;
}
