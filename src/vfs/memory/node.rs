/*!
 * Filesystem Node Types
 * Internal representation of files, directories and links
 */

use std::collections::BTreeSet;
use std::time::SystemTime;

use super::super::persist::SnapshotEntry;
use super::super::types::FileType;

/// In-memory filesystem node
#[derive(Debug, Clone)]
pub(in crate::vfs) enum Node {
    File {
        data: Vec<u8>,
        modified: SystemTime,
    },
    Directory {
        children: BTreeSet<String>,
        created: SystemTime,
    },
    Symlink {
        target: String,
    },
}

impl Node {
    pub fn empty_dir() -> Self {
        Node::Directory {
            children: BTreeSet::new(),
            created: SystemTime::now(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
            Node::Symlink { .. } => FileType::Symlink,
        }
    }

    /// Persisted form of this node (directory children are implied by paths)
    pub fn to_snapshot(&self) -> SnapshotEntry {
        match self {
            Node::File { data, .. } => SnapshotEntry::File(data.clone()),
            Node::Directory { .. } => SnapshotEntry::Directory,
            Node::Symlink { target } => SnapshotEntry::Symlink(target.clone()),
        }
    }

    pub fn from_snapshot(entry: &SnapshotEntry) -> Self {
        match entry {
            SnapshotEntry::Directory => Node::empty_dir(),
            SnapshotEntry::File(data) => Node::File {
                data: data.clone(),
                modified: SystemTime::now(),
            },
            SnapshotEntry::Symlink(target) => Node::Symlink {
                target: target.clone(),
            },
        }
    }
}
