/*!
 * Host Directory Persistence Store
 * Keeps one bincode snapshot file per mount point under a host directory
 */

use std::fs;
use std::path::{Path, PathBuf};

use super::{PersistentStore, Snapshot};
use crate::vfs::types::{VfsError, VfsResult};

const SNAPSHOT_EXT: &str = "snapshot";
const PARTIAL_EXT: &str = "partial";

/// Snapshot store rooted at a host directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at the specified host directory
    ///
    /// The directory is created lazily on the first flush.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host file holding the snapshot for a mount point
    ///
    /// The key is hex-encoded so distinct mount points never collide and no
    /// key can escape the store root.
    pub fn snapshot_path(&self, key: &str) -> PathBuf {
        let encoded: String = key.bytes().map(|b| format!("{:02x}", b)).collect();
        self.root.join(format!("{}.{}", encoded, SNAPSHOT_EXT))
    }
}

impl PersistentStore for DirectoryStore {
    fn load(&self, key: &str) -> VfsResult<Option<Snapshot>> {
        let path = self.snapshot_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VfsError::from_io(
                    e,
                    format!("read snapshot {}", path.display()),
                ))
            }
        };

        bincode::deserialize(&bytes).map(Some).map_err(|e| {
            VfsError::Serialization(format!("decode snapshot {}: {}", path.display(), e))
        })
    }

    fn store(&self, key: &str, snapshot: &Snapshot) -> VfsResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            VfsError::from_io(e, format!("create store dir {}", self.root.display()))
        })?;

        let bytes = bincode::serialize(snapshot)
            .map_err(|e| VfsError::Serialization(format!("encode snapshot for {}: {}", key, e)))?;

        // Write aside then rename so a crash never leaves a torn snapshot
        let target = self.snapshot_path(key);
        let partial = target.with_extension(PARTIAL_EXT);
        fs::write(&partial, &bytes)
            .map_err(|e| VfsError::from_io(e, format!("write {}", partial.display())))?;
        fs::rename(&partial, &target)
            .map_err(|e| VfsError::from_io(e, format!("rename to {}", target.display())))
    }

    fn name(&self) -> &str {
        "local_directory"
    }
}
