/*!
 * Storage Root Paths
 * Validation and segmentation of caller-supplied storage roots
 */

use std::fmt;

use super::errors::{StorageError, StorageResult};
use crate::core::limits::{CURRENT_DIR, PATH_SEPARATOR};

/// A storage root split into validated segments
///
/// Invariant: `segments` is non-empty and no segment is empty or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootPath {
    segments: Vec<String>,
    absolute: bool,
}

impl RootPath {
    /// Validate and segment a storage root
    ///
    /// Fails with `Configuration` when absolute addressing is required and
    /// the path is relative, when nothing remains after dropping empty and
    /// `.` segments, or when the path is deeper than `max_depth`.
    pub fn parse(root: &str, requires_absolute: bool, max_depth: usize) -> StorageResult<Self> {
        let absolute = root.starts_with(PATH_SEPARATOR);
        if requires_absolute && !absolute {
            return Err(StorageError::Configuration(format!(
                "storage root must be an absolute path in this environment: {:?}",
                root
            )));
        }

        let segments: Vec<String> = root
            .split(PATH_SEPARATOR)
            .filter(|s| !s.is_empty() && *s != CURRENT_DIR)
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(StorageError::Configuration(format!(
                "storage root must not be empty: {:?}",
                root
            )));
        }

        if segments.len() > max_depth {
            return Err(StorageError::Configuration(format!(
                "storage root is {} levels deep, limit is {}",
                segments.len(),
                max_depth
            )));
        }

        Ok(Self { segments, absolute })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The path as handed to the filesystem
    pub fn to_path_string(&self) -> String {
        materialize(&self.segments, self.absolute)
    }
}

impl fmt::Display for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

/// Validate a root without building a `RootPath`
///
/// Returns the segment sequence and whether the root was absolute.
pub fn validate(root: &str, requires_absolute: bool) -> StorageResult<(Vec<String>, bool)> {
    let parsed = RootPath::parse(root, requires_absolute, usize::MAX)?;
    Ok((parsed.segments, parsed.absolute))
}

/// Join segments into a filesystem path, rooted when `absolute`
pub fn materialize<S: AsRef<str>>(segments: &[S], absolute: bool) -> String {
    let joined = segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("{}{}", PATH_SEPARATOR, joined)
    } else {
        joined
    }
}
