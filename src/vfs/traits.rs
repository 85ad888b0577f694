/*!
 * VFS Traits
 * Primitives consumed from the embedded virtual filesystem
 */

use super::types::*;

/// Completion callback for `VirtualFs::syncfs`
///
/// Invoked exactly once with `None` on success or the failure otherwise.
pub type SyncCallback = Box<dyn FnOnce(Option<VfsError>) + Send + 'static>;

/// Virtual filesystem trait
///
/// The sandboxed file tree exposed by the embedded execution module.
/// Paths are `/`-separated strings; relative paths resolve against the
/// filesystem's own working directory.
pub trait VirtualFs: Send + Sync {
    /// Query a path without failing when nothing is there
    ///
    /// With `follow_links` false a symlink is reported as itself.
    fn analyze_path(&self, path: &str, follow_links: bool) -> VfsResult<PathAnalysis>;

    /// Create a single directory
    ///
    /// Fails with `AlreadyExists` if the path is taken and `NotFound` if the
    /// parent is missing. Never creates parents.
    fn mkdir(&self, path: &str) -> VfsResult<()>;

    /// Attach a persistence backend at an existing directory
    fn mount(
        &self,
        backend: PersistenceBackend,
        options: &MountOptions,
        mount_point: &str,
    ) -> VfsResult<()>;

    /// Synchronize memory with persistence
    ///
    /// `populate` true loads backend state into memory; false flushes memory
    /// to the backend. Completion is reported through `callback`, which may
    /// run before this call returns.
    fn syncfs(&self, populate: bool, callback: SyncCallback);

    /// Get filesystem name/type
    fn name(&self) -> &str {
        "vfs"
    }
}
