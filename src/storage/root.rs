/*!
 * Storage Root Manager
 * Mount/sync lifecycle of one storage root inside a virtual filesystem
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use super::config::{HostEnvironment, StorageConfig};
use super::ensure::ensure_create_dir;
use super::errors::{FsOperation, StorageError, StorageResult};
use super::paths::RootPath;
use crate::core::limits::DEFAULT_STORAGE_ROOT;
use crate::monitoring::OperationSpan;
use crate::vfs::{MountOptions, PersistenceBackend, VirtualFs};

/// Persistence backend bound to the storage root
///
/// Created by the first successful mount and kept for the lifetime of the
/// manager. Never unmounted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountBinding {
    pub backend: PersistenceBackend,
    pub options: MountOptions,
    pub mount_point: String,
}

#[derive(Debug, Default)]
struct StorageState {
    root: Option<RootPath>,
    mount: Option<MountBinding>,
    initialized: bool,
}

/// Owns one storage root on a virtual filesystem
///
/// `init` and `sync` take an internal operation lock, so concurrent callers
/// on one instance run one after another instead of interleaving syncs.
pub struct StorageManager {
    fs: Arc<dyn VirtualFs>,
    config: StorageConfig,
    state: Mutex<StorageState>,
    op_lock: AsyncMutex<()>,
}

impl StorageManager {
    /// Create a manager with environment defaults
    pub fn new(fs: Arc<dyn VirtualFs>, environment: HostEnvironment) -> Self {
        Self::with_config(fs, StorageConfig::new(DEFAULT_STORAGE_ROOT, environment))
    }

    pub fn with_config(fs: Arc<dyn VirtualFs>, config: StorageConfig) -> Self {
        info!(
            fs = fs.name(),
            environment = %config.environment,
            backend = %config.backend,
            "storage manager created"
        );
        Self {
            fs,
            config,
            state: Mutex::new(StorageState::default()),
            op_lock: AsyncMutex::new(()),
        }
    }

    /// Initialize the storage root
    ///
    /// Validates the path, creates every missing directory along it, mounts
    /// the persistence backend when the environment needs an explicit mount,
    /// then populates memory from persistence. Validation failures return
    /// before the filesystem is touched. On any later failure the directories
    /// created so far stay in place and `init` can be retried.
    pub async fn init(&self, root: &str) -> StorageResult<()> {
        let _op = self.op_lock.lock().await;
        let environment = self.config.environment;

        let root_path = RootPath::parse(
            root,
            environment.requires_absolute_paths(),
            self.config.max_depth,
        )?;
        let path = root_path.to_path_string();
        info!(root = %path, environment = %environment, "initializing storage root");

        self.state.lock().initialized = false;

        ensure_create_dir(self.fs.as_ref(), root_path.segments(), root_path.is_absolute())?;

        if environment.requires_explicit_mount() {
            self.mount_root(&path)?;
        }

        self.state.lock().root = Some(root_path);
        self.sync_locked(true).await?;

        self.state.lock().initialized = true;
        info!(root = %path, "storage root initialized");
        Ok(())
    }

    /// Synchronize memory with persistence
    ///
    /// `populate = true` loads persisted state over memory; `false` flushes
    /// memory to persistence. Does not repeat directory creation or mounting.
    pub async fn sync(&self, populate: bool) -> StorageResult<()> {
        let _op = self.op_lock.lock().await;
        self.sync_locked(populate).await
    }

    /// Flush memory to persistence
    pub async fn flush(&self) -> StorageResult<()> {
        self.sync(false).await
    }

    /// Mount the backend unless this root is already bound
    fn mount_root(&self, path: &str) -> StorageResult<()> {
        let bound = self
            .state
            .lock()
            .mount
            .as_ref()
            .map(|m| m.mount_point == path)
            .unwrap_or(false);
        if bound {
            debug!(mount_point = %path, "backend already mounted, skipping");
            return Ok(());
        }

        self.fs
            .mount(self.config.backend, &self.config.mount_options, path)
            .map_err(StorageError::fs(FsOperation::Mount, path))?;

        info!(mount_point = %path, backend = %self.config.backend, "persistence backend mounted");
        self.state.lock().mount = Some(MountBinding {
            backend: self.config.backend,
            options: self.config.mount_options.clone(),
            mount_point: path.to_string(),
        });
        Ok(())
    }

    /// Run one `syncfs` and await its callback; caller holds the op lock
    async fn sync_locked(&self, populate: bool) -> StorageResult<()> {
        let operation = FsOperation::for_sync(populate);
        let path = self
            .state
            .lock()
            .root
            .as_ref()
            .map(|r| r.to_path_string())
            .unwrap_or_else(|| "/".to_string());

        let span = OperationSpan::new(if populate { "sync_populate" } else { "sync_flush" });
        info!(root = %path, populate = populate, trace_id = span.trace_id(), "syncing storage");

        let (tx, rx) = oneshot::channel();
        self.fs.syncfs(
            populate,
            Box::new(move |err| {
                let _ = tx.send(err);
            }),
        );

        let received = match self.config.sync_timeout {
            Some(duration) => match tokio::time::timeout(duration, rx).await {
                Ok(received) => received,
                Err(_) => {
                    let err = StorageError::Timeout {
                        operation,
                        timeout: duration,
                    };
                    warn!(root = %path, timeout_ms = duration.as_millis() as u64, "sync timed out");
                    span.record_error(&err);
                    return Err(err);
                }
            },
            None => rx.await,
        };

        let result = match received {
            Ok(None) => Ok(()),
            Ok(Some(source)) => Err(StorageError::FilesystemOperation {
                operation,
                path,
                source,
            }),
            Err(_) => {
                warn!(populate = populate, "sync callback dropped without a result");
                Err(StorageError::SyncInterrupted { operation })
            }
        };

        match &result {
            Ok(()) => span.record_result(true),
            Err(e) => span.record_error(e),
        }
        result
    }

    /// Root of the most recent `init` that got past validation
    pub fn root(&self) -> Option<String> {
        self.state.lock().root.as_ref().map(|r| r.to_path_string())
    }

    #[inline]
    pub fn environment(&self) -> HostEnvironment {
        self.config.environment
    }

    /// Whether the most recent `init` completed
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn mount_binding(&self) -> Option<MountBinding> {
        self.state.lock().mount.clone()
    }
}

impl fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("StorageManager")
            .field("fs", &self.fs.name())
            .field("environment", &self.config.environment)
            .field("root", &state.root)
            .field("initialized", &state.initialized)
            .finish()
    }
}
