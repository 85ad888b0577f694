/*!
 * Directory Ensurer
 * Idempotent creation of every directory along a storage root
 */

use tracing::debug;

use super::errors::{FsOperation, StorageError, StorageResult};
use super::paths::materialize;
use crate::vfs::VirtualFs;

/// Make sure the directory named by `segments` and all its ancestors exist
///
/// Existence is re-queried on every call, so repeating it is a no-op. The
/// parent is handled before the child because `mkdir` never creates
/// intermediate directories, and existence is checked again once the parent
/// pass is done. Recursion depth equals `segments.len()`; the caller bounds
/// it when validating the root.
pub fn ensure_create_dir<S: AsRef<str>>(
    fs: &dyn VirtualFs,
    segments: &[S],
    is_absolute: bool,
) -> StorageResult<()> {
    let dir = materialize(segments, is_absolute);

    let analysis = fs
        .analyze_path(&dir, false)
        .map_err(StorageError::fs(FsOperation::Analyze, &dir))?;
    if analysis.exists {
        return Ok(());
    }

    if segments.len() > 1 {
        ensure_create_dir(fs, &segments[..segments.len() - 1], is_absolute)?;

        // With `..` segments the parent pass may already have created `dir`
        let analysis = fs
            .analyze_path(&dir, false)
            .map_err(StorageError::fs(FsOperation::Analyze, &dir))?;
        if analysis.exists {
            return Ok(());
        }
    }

    fs.mkdir(&dir)
        .map_err(StorageError::fs(FsOperation::Mkdir, &dir))?;
    debug!(path = %dir, "created storage directory");
    Ok(())
}
