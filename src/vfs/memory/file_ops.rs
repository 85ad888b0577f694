/*!
 * File Operations Implementation
 * Whole-file reads and writes plus symbolic links
 */

use std::time::SystemTime;

use super::super::types::*;
use super::node::Node;
use super::{file_name, parent_of, MemFS};

impl MemFS {
    /// Write entire file contents (create or overwrite)
    pub fn write_file(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        let path = self.follow(self.resolve(path)?)?;
        let parent = self.ensure_parent(&path)?;

        if let Some(node) = self.nodes.get(&path) {
            if node.is_dir() {
                return Err(VfsError::IsADirectory(path));
            }
        }

        self.nodes.insert(
            path.clone(),
            Node::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        self.add_child(&parent, file_name(&path))
    }

    /// Read entire file contents
    pub fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        let path = self.follow(self.resolve(path)?)?;
        match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::File { data, .. }) => Ok(data),
            Some(_) => Err(VfsError::IsADirectory(path)),
            None => Err(VfsError::NotFound(path)),
        }
    }

    /// Create a symbolic link at `path` pointing to `target`
    ///
    /// The target is stored verbatim and need not exist.
    pub fn symlink(&self, target: &str, path: &str) -> VfsResult<()> {
        let path = self.resolve(path)?;
        let parent = self.ensure_parent(&path)?;
        if self.nodes.contains_key(&path) {
            return Err(VfsError::AlreadyExists(path));
        }

        self.nodes.insert(
            path.clone(),
            Node::Symlink {
                target: target.to_string(),
            },
        );
        self.add_child(&parent, file_name(&path))
    }

    /// Read symbolic link target
    pub fn read_link(&self, path: &str) -> VfsResult<String> {
        let path = self.resolve(path)?;
        match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::Symlink { target }) => Ok(target),
            Some(_) => Err(VfsError::InvalidPath(format!("not a symlink: {}", path))),
            None => Err(VfsError::NotFound(path)),
        }
    }

    /// Delete a file or link
    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        let path = self.resolve(path)?;
        match self.nodes.get(&path).map(|n| n.is_dir()) {
            Some(false) => {}
            Some(true) => return Err(VfsError::IsADirectory(path)),
            None => return Err(VfsError::NotFound(path)),
        }

        self.nodes.remove(&path);
        if let Some(parent) = parent_of(&path) {
            self.remove_child(&parent, file_name(&path));
        }
        Ok(())
    }
}
