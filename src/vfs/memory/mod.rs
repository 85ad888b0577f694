/*!
 * In-Memory Filesystem Backend
 * Volatile file tree with pluggable persistence, mirroring the embedded
 * runtime's filesystem semantics
 */

mod dir_ops;
mod file_ops;
mod node;
mod sync_ops;

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::persist::PersistentStore;
use super::traits::{SyncCallback, VirtualFs};
use super::types::*;
use crate::core::limits::MAX_SYMLINK_HOPS;
use node::Node;

/// Backend attached at a mount point
#[derive(Clone)]
pub(super) struct MountEntry {
    backend: PersistenceBackend,
    options: MountOptions,
    store: Arc<dyn PersistentStore>,
}

/// In-memory filesystem implementation
///
/// Clones share the same tree, mount table and stores.
#[derive(Clone)]
pub struct MemFS {
    pub(super) nodes: Arc<DashMap<String, Node, RandomState>>,
    pub(super) cwd: Arc<RwLock<String>>,
    pub(super) mounts: Arc<DashMap<String, MountEntry, RandomState>>,
    pub(super) stores: Arc<DashMap<PersistenceBackend, Arc<dyn PersistentStore>, RandomState>>,
    pub(super) syncs_in_flight: Arc<AtomicUsize>,
}

impl MemFS {
    /// Create new in-memory filesystem with only `/`
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        nodes.insert("/".to_string(), Node::empty_dir());

        Self {
            nodes: Arc::new(nodes),
            cwd: Arc::new(RwLock::new("/".to_string())),
            mounts: Arc::new(DashMap::with_hasher(RandomState::new())),
            stores: Arc::new(DashMap::with_hasher(RandomState::new())),
            syncs_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register the store that backs mounts of `backend`
    pub fn with_store(self, backend: PersistenceBackend, store: Arc<dyn PersistentStore>) -> Self {
        self.stores.insert(backend, store);
        self
    }

    /// Persist the whole tree through `store` without an explicit mount
    ///
    /// Models hosts where durable storage is available out of the box: `/`
    /// is bound at construction and every `syncfs` covers it.
    pub fn with_persistent_root(
        self,
        backend: PersistenceBackend,
        store: Arc<dyn PersistentStore>,
    ) -> Self {
        self.stores.insert(backend, Arc::clone(&store));
        self.mounts.insert(
            "/".to_string(),
            MountEntry {
                backend,
                options: MountOptions::new(),
                store,
            },
        );
        self
    }

    /// Resolve a path to its absolute, cleaned form
    ///
    /// Relative paths are joined onto the working directory; `.`, `..` and
    /// repeated separators are folded.
    pub(super) fn resolve(&self, path: &str) -> VfsResult<String> {
        if path.is_empty() {
            return Err(VfsError::InvalidPath("empty path".to_string()));
        }

        let joined = if path.starts_with('/') {
            path.to_string()
        } else {
            join(&self.cwd.read(), path)
        };

        path_clean::clean(Path::new(&joined))
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| VfsError::InvalidPath(format!("invalid UTF-8 in path: {}", path)))
    }

    /// Follow symlinks at the final component until a non-link is reached
    pub(super) fn follow(&self, path: String) -> VfsResult<String> {
        let mut current = path;
        for _ in 0..MAX_SYMLINK_HOPS {
            let target = match self.nodes.get(&current).map(|n| n.value().clone()) {
                Some(Node::Symlink { target }) => target,
                _ => return Ok(current),
            };
            current = if target.starts_with('/') {
                self.resolve(&target)?
            } else {
                let base = parent_of(&current).unwrap_or_else(|| "/".to_string());
                self.resolve(&join(&base, &target))?
            };
        }
        Err(VfsError::InvalidPath(format!(
            "too many levels of symbolic links: {}",
            current
        )))
    }

    /// Current working directory
    pub fn cwd(&self) -> String {
        self.cwd.read().clone()
    }

    /// Change the working directory relative paths resolve against
    pub fn chdir(&self, path: &str) -> VfsResult<()> {
        let resolved = self.follow(self.resolve(path)?)?;
        match self.nodes.get(&resolved).map(|n| n.is_dir()) {
            Some(true) => {
                *self.cwd.write() = resolved;
                Ok(())
            }
            Some(false) => Err(VfsError::NotADirectory(resolved)),
            None => Err(VfsError::NotFound(resolved)),
        }
    }

    /// Check if a node exists at the path (links followed)
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path)
            .and_then(|p| self.follow(p))
            .map(|p| self.nodes.contains_key(&p))
            .unwrap_or(false)
    }

    /// Mount points and their backends
    pub fn list_mounts(&self) -> Vec<(String, PersistenceBackend)> {
        let mut mounts: Vec<_> = self
            .mounts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().backend))
            .collect();
        mounts.sort_by(|a, b| a.0.cmp(&b.0));
        mounts
    }

    /// Check if a backend is mounted exactly at the path
    pub fn is_mounted(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|p| self.mounts.contains_key(&p))
            .unwrap_or(false)
    }

    /// Options a mount point was bound with
    pub fn mount_options(&self, path: &str) -> Option<MountOptions> {
        let path = self.resolve(path).ok()?;
        self.mounts.get(&path).map(|m| m.options.clone())
    }

    /// Link `name` into the directory at `parent`
    pub(super) fn add_child(&self, parent: &str, name: &str) -> VfsResult<()> {
        match self.nodes.get_mut(parent) {
            Some(mut node) => match node.value_mut() {
                Node::Directory { children, .. } => {
                    children.insert(name.to_string());
                    Ok(())
                }
                _ => Err(VfsError::NotADirectory(parent.to_string())),
            },
            None => Err(VfsError::NotFound(format!(
                "parent directory not found: {}",
                parent
            ))),
        }
    }

    /// Ensure the parent of `path` exists and is a directory
    pub(super) fn ensure_parent(&self, path: &str) -> VfsResult<String> {
        let parent = parent_of(path)
            .ok_or_else(|| VfsError::InvalidPath(format!("path has no parent: {}", path)))?;
        match self.nodes.get(&parent).map(|n| n.is_dir()) {
            Some(true) => Ok(parent),
            Some(false) => Err(VfsError::NotADirectory(parent)),
            None => Err(VfsError::NotFound(format!(
                "parent directory not found: {}",
                parent
            ))),
        }
    }
}

impl Default for MemFS {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemFS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemFS")
            .field("nodes", &self.nodes.len())
            .field("cwd", &*self.cwd.read())
            .field("mounts", &self.list_mounts())
            .finish_non_exhaustive()
    }
}

impl VirtualFs for MemFS {
    fn analyze_path(&self, path: &str, follow_links: bool) -> VfsResult<PathAnalysis> {
        self.analyze_impl(path, follow_links)
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        self.mkdir_impl(path)
    }

    fn mount(
        &self,
        backend: PersistenceBackend,
        options: &MountOptions,
        mount_point: &str,
    ) -> VfsResult<()> {
        self.mount_impl(backend, options, mount_point)
    }

    fn syncfs(&self, populate: bool, callback: SyncCallback) {
        self.syncfs_impl(populate, callback)
    }

    fn name(&self) -> &str {
        "memfs"
    }
}

/// Join a directory and a relative name
pub(super) fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Parent of an absolute, cleaned path (`None` for `/`)
pub(super) fn parent_of(path: &str) -> Option<String> {
    match path.rfind('/') {
        _ if path == "/" => None,
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Final component of an absolute, cleaned path
pub(super) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether `path` is `base` or lies beneath it
pub(super) fn is_within(path: &str, base: &str) -> bool {
    if base == "/" {
        return path.starts_with('/');
    }
    path == base
        || (path.starts_with(base) && path.as_bytes().get(base.len()) == Some(&b'/'))
}
