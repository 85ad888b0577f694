/*!
 * Path Analysis
 * Result of querying a path without failing on absence
 */

use serde::{Deserialize, Serialize};

use super::file_type::FileType;

/// Outcome of `VirtualFs::analyze_path`
///
/// Absence is data, not an error: callers branch on `exists` instead of
/// matching on `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAnalysis {
    /// Resolved absolute path that was analyzed
    pub path: String,
    /// Final path component (empty for the root)
    pub name: String,
    pub exists: bool,
    pub is_root: bool,
    /// Type of the node when it exists
    pub file_type: Option<FileType>,
    pub parent_path: Option<String>,
    pub parent_exists: bool,
}

impl PathAnalysis {
    /// Analysis of a path with nothing at it
    pub fn missing(path: impl Into<String>) -> Self {
        let path = path.into();
        let (parent_path, name) = split_parent(&path);
        Self {
            path,
            name,
            exists: false,
            is_root: false,
            file_type: None,
            parent_path,
            parent_exists: false,
        }
    }

    /// Analysis of an existing node
    pub fn found(path: impl Into<String>, file_type: FileType) -> Self {
        let path = path.into();
        let is_root = path == "/";
        let (parent_path, name) = split_parent(&path);
        Self {
            path,
            name,
            exists: true,
            is_root,
            file_type: Some(file_type),
            parent_exists: parent_path.is_some(),
            parent_path,
        }
    }

    /// Record whether the parent directory exists
    pub fn with_parent_exists(mut self, parent_exists: bool) -> Self {
        self.parent_exists = parent_exists;
        self
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == Some(FileType::Directory)
    }
}

fn split_parent(path: &str) -> (Option<String>, String) {
    if path == "/" {
        return (None, String::new());
    }
    match path.rfind('/') {
        Some(0) => (Some("/".to_string()), path[1..].to_string()),
        Some(idx) => (Some(path[..idx].to_string()), path[idx + 1..].to_string()),
        None => (None, path.to_string()),
    }
}
