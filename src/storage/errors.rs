/*!
 * Storage Error Types
 * Configuration and filesystem-operation failures of storage-root management
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::vfs::VfsError;

/// Storage-root operation result
#[must_use = "storage operations can fail and must be handled"]
pub type StorageResult<T> = Result<T, StorageError>;

/// Filesystem primitive that was running when a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsOperation {
    /// Path existence analysis
    Analyze,
    /// Directory creation
    Mkdir,
    /// Persistence backend mount
    Mount,
    /// Load persisted state into memory
    Populate,
    /// Write memory state to persistence
    Flush,
}

impl FsOperation {
    pub fn for_sync(populate: bool) -> Self {
        if populate {
            FsOperation::Populate
        } else {
            FsOperation::Flush
        }
    }
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FsOperation::Analyze => write!(f, "analyze path"),
            FsOperation::Mkdir => write!(f, "create directory"),
            FsOperation::Mount => write!(f, "mount persistence backend"),
            FsOperation::Populate => write!(f, "populate from persistence"),
            FsOperation::Flush => write!(f, "flush to persistence"),
        }
    }
}

/// Storage-root errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum StorageError {
    #[error("Invalid storage root: {0}")]
    #[diagnostic(
        code(storage::configuration),
        help("Supply a corrected storage root; retrying with the same path will fail again.")
    )]
    Configuration(String),

    #[error("Failed to {operation} at {path}: {source}")]
    #[diagnostic(
        code(storage::filesystem_operation),
        help("Directory creation is idempotent, so init can be retried. Do not blindly retry a failed mount.")
    )]
    FilesystemOperation {
        operation: FsOperation,
        path: String,
        #[source]
        source: VfsError,
    },

    #[error("Sync ({operation}) completion was dropped without a result")]
    #[diagnostic(
        code(storage::sync_interrupted),
        help("The filesystem discarded its completion callback; the sync outcome is unknown.")
    )]
    SyncInterrupted { operation: FsOperation },

    #[error("Sync ({operation}) did not complete within {timeout:?}")]
    #[diagnostic(
        code(storage::timeout),
        help("The persistence backend may be hung. Increase sync_timeout or inspect the backend.")
    )]
    Timeout {
        operation: FsOperation,
        timeout: Duration,
    },
}

impl StorageError {
    /// Build a mapper that wraps a VFS failure with what was being attempted
    ///
    /// ```ignore
    /// fs.mkdir(&path).map_err(StorageError::fs(FsOperation::Mkdir, &path))?;
    /// ```
    pub fn fs(operation: FsOperation, path: &str) -> impl FnOnce(VfsError) -> StorageError + '_ {
        move |source| StorageError::FilesystemOperation {
            operation,
            path: path.to_string(),
            source,
        }
    }

    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, StorageError::Configuration(_))
    }

    /// Underlying VFS failure, if any
    pub fn vfs_error(&self) -> Option<&VfsError> {
        match self {
            StorageError::FilesystemOperation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Operation the failure happened in, if any
    pub fn operation(&self) -> Option<FsOperation> {
        match self {
            StorageError::Configuration(_) => None,
            StorageError::FilesystemOperation { operation, .. }
            | StorageError::SyncInterrupted { operation }
            | StorageError::Timeout { operation, .. } => Some(*operation),
        }
    }
}
