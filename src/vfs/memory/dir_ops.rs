/*!
 * Directory Operations Implementation
 * Analysis, creation, listing and mounting
 */

use std::sync::Arc;
use tracing::debug;

use super::super::types::*;
use super::node::Node;
use super::{file_name, is_within, parent_of, MemFS, MountEntry};

impl MemFS {
    pub(super) fn analyze_impl(&self, path: &str, follow_links: bool) -> VfsResult<PathAnalysis> {
        let mut resolved = self.resolve(path)?;
        if follow_links {
            resolved = self.follow(resolved)?;
        }

        let parent_exists = parent_of(&resolved)
            .map(|p| self.nodes.get(&p).map(|n| n.is_dir()).unwrap_or(false))
            .unwrap_or(false);

        let file_type = self.nodes.get(&resolved).map(|n| n.file_type());
        Ok(match file_type {
            Some(ft) => PathAnalysis::found(resolved, ft),
            None => PathAnalysis::missing(resolved).with_parent_exists(parent_exists),
        })
    }

    pub(super) fn mkdir_impl(&self, path: &str) -> VfsResult<()> {
        let path = self.resolve(path)?;
        if self.nodes.contains_key(&path) {
            return Err(VfsError::AlreadyExists(path));
        }

        let parent = self.ensure_parent(&path)?;

        match self.nodes.entry(path.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(VfsError::AlreadyExists(path));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Node::empty_dir());
            }
        }
        self.add_child(&parent, file_name(&path))?;

        debug!(path = %path, "directory created");
        Ok(())
    }

    /// List names in a directory, sorted
    pub fn read_dir(&self, path: &str) -> VfsResult<Vec<String>> {
        let path = self.follow(self.resolve(path)?)?;
        match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) => Ok(children.into_iter().collect()),
            Some(_) => Err(VfsError::NotADirectory(path)),
            None => Err(VfsError::NotFound(path)),
        }
    }

    /// Remove an empty directory
    pub fn rmdir(&self, path: &str) -> VfsResult<()> {
        let path = self.resolve(path)?;
        if self.mounts.iter().any(|m| is_within(m.key(), &path)) {
            return Err(VfsError::Busy(path));
        }

        match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) if children.is_empty() => {}
            Some(Node::Directory { .. }) => {
                return Err(VfsError::InvalidPath(format!("directory not empty: {}", path)))
            }
            Some(_) => return Err(VfsError::NotADirectory(path)),
            None => return Err(VfsError::NotFound(path)),
        }

        self.nodes.remove(&path);
        if let Some(parent) = parent_of(&path) {
            self.remove_child(&parent, file_name(&path));
        }
        Ok(())
    }

    pub(super) fn mount_impl(
        &self,
        backend: PersistenceBackend,
        options: &MountOptions,
        mount_point: &str,
    ) -> VfsResult<()> {
        let mount_point = self.resolve(mount_point)?;

        match self.nodes.get(&mount_point).map(|n| n.is_dir()) {
            Some(true) => {}
            Some(false) => return Err(VfsError::NotADirectory(mount_point)),
            None => return Err(VfsError::NotFound(mount_point)),
        }

        let store = self
            .stores
            .get(&backend)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| {
                VfsError::NotSupported(format!("no store registered for backend {}", backend))
            })?;

        match self.mounts.entry(mount_point.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(VfsError::Busy(format!(
                "mount point already in use: {}",
                mount_point
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(MountEntry {
                    backend,
                    options: options.clone(),
                    store,
                });
                debug!(mount_point = %mount_point, backend = %backend, "backend mounted");
                Ok(())
            }
        }
    }

    pub(super) fn remove_child(&self, parent: &str, name: &str) {
        if let Some(mut node) = self.nodes.get_mut(parent) {
            if let Node::Directory { children, .. } = node.value_mut() {
                children.remove(name);
            }
        }
    }
}
