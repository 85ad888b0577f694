/*!
 * Sync Operations Implementation
 * Populate mounted subtrees from their stores, or flush them back
 */

use std::sync::atomic::Ordering;
use tracing::{debug, warn};

use super::super::persist::Snapshot;
use super::super::traits::SyncCallback;
use super::super::types::*;
use super::node::Node;
use super::{file_name, is_within, join, parent_of, MemFS, MountEntry};

impl MemFS {
    pub(super) fn syncfs_impl(&self, populate: bool, callback: SyncCallback) {
        let in_flight = self.syncs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        if in_flight > 1 {
            warn!(in_flight = in_flight, "overlapping syncfs calls, state may be inconsistent");
        }

        // Parents before nested mounts so a populate never clobbers a child mount
        let mut mounts: Vec<(String, MountEntry)> = self
            .mounts
            .iter()
            .map(|m| (m.key().clone(), m.value().clone()))
            .collect();
        mounts.sort_by(|a, b| a.0.len().cmp(&b.0.len()));

        let mut first_error = None;
        for (mount_point, entry) in &mounts {
            let result = if populate {
                self.populate_mount(mount_point, entry)
            } else {
                self.flush_mount(mount_point, entry)
            };

            if let Err(e) = result {
                warn!(mount_point = %mount_point, populate = populate, error = %e, "mount sync failed");
                first_error.get_or_insert(e);
            }
        }

        self.syncs_in_flight.fetch_sub(1, Ordering::SeqCst);
        callback(first_error);
    }

    /// Mount points strictly beneath `mount_point`
    fn nested_mounts(&self, mount_point: &str) -> Vec<String> {
        self.mounts
            .iter()
            .map(|m| m.key().clone())
            .filter(|m| m != mount_point && is_within(m, mount_point))
            .collect()
    }

    /// Paths owned by the mount: beneath it, not inside a nested mount.
    /// Nested mount points themselves are included as plain directories.
    fn owned_paths(&self, mount_point: &str) -> Vec<String> {
        let nested = self.nested_mounts(mount_point);
        let mut paths: Vec<String> = self
            .nodes
            .iter()
            .map(|n| n.key().clone())
            .filter(|p| p != mount_point && is_within(p, mount_point))
            .filter(|p| !nested.iter().any(|m| p != m && is_within(p, m)))
            .collect();
        paths.sort();
        paths
    }

    fn flush_mount(&self, mount_point: &str, entry: &MountEntry) -> VfsResult<()> {
        let mut snapshot = Snapshot::new();
        for path in self.owned_paths(mount_point) {
            if let Some(node) = self.nodes.get(&path).map(|n| n.to_snapshot()) {
                snapshot.insert(relative(&path, mount_point), node);
            }
        }

        debug!(
            mount_point = %mount_point,
            store = entry.store.name(),
            entries = snapshot.len(),
            "flushing mount"
        );
        entry.store.store(mount_point, &snapshot)
    }

    fn populate_mount(&self, mount_point: &str, entry: &MountEntry) -> VfsResult<()> {
        let snapshot = match entry.store.load(mount_point)? {
            Some(snapshot) => snapshot,
            None => {
                debug!(mount_point = %mount_point, "no persisted state, keeping memory as is");
                return Ok(());
            }
        };

        let nested = self.nested_mounts(mount_point);
        for path in self.owned_paths(mount_point) {
            if nested.contains(&path) {
                continue;
            }
            self.nodes.remove(&path);
        }
        self.prune_children(mount_point);

        for (rel_path, persisted) in snapshot.iter() {
            let path = join(mount_point, rel_path);
            if nested.contains(&path) {
                continue;
            }

            let parent = parent_of(&path)
                .ok_or_else(|| VfsError::Serialization(format!("snapshot entry has no parent: {}", path)))?;
            if !self.nodes.get(&parent).map(|n| n.is_dir()).unwrap_or(false) {
                return Err(VfsError::Serialization(format!(
                    "snapshot entry {} precedes its parent directory",
                    path
                )));
            }

            self.nodes.insert(path.clone(), Node::from_snapshot(persisted));
            self.add_child(&parent, file_name(&path))?;
        }

        debug!(mount_point = %mount_point, entries = snapshot.len(), "mount populated");
        Ok(())
    }

    /// Drop child names whose nodes no longer exist under `mount_point`
    fn prune_children(&self, mount_point: &str) {
        let dirs: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.is_dir() && is_within(n.key(), mount_point))
            .map(|n| n.key().clone())
            .collect();

        for dir in dirs {
            let names = match self.nodes.get(&dir).map(|n| n.value().clone()) {
                Some(Node::Directory { children, .. }) => children,
                _ => continue,
            };
            for name in names {
                if !self.nodes.contains_key(&join(&dir, &name)) {
                    self.remove_child(&dir, &name);
                }
            }
        }
    }
}

/// Path of `path` relative to `mount_point`, without a leading separator
fn relative(path: &str, mount_point: &str) -> String {
    if mount_point == "/" {
        path.trim_start_matches('/').to_string()
    } else {
        path[mount_point.len()..].trim_start_matches('/').to_string()
    }
}
