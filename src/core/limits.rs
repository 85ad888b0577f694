/*!
 * System Limits and Constants
 *
 * Centralized location for storage-root limits, thresholds, and defaults.
 * Organized by domain for maintainability and discoverability.
 *
 * - Security-relevant constants are marked with [SECURITY]
 * - Performance-relevant constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// PATH LIMITS
// =============================================================================

/// Path separator used by the virtual filesystem
pub const PATH_SEPARATOR: char = '/';

/// Current-directory marker dropped during normalization
pub const CURRENT_DIR: &str = ".";

/// Maximum storage root depth (64 segments)
/// [SECURITY] Directory creation recurses once per segment
pub const MAX_ROOT_DEPTH: usize = 64;

/// Maximum symlink hops when following links (40, as on Linux)
/// [SECURITY] Bounds link cycles
pub const MAX_SYMLINK_HOPS: usize = 40;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Storage root used when none is configured
pub const DEFAULT_STORAGE_ROOT: &str = "/beekeeper";

/// Sync duration above which a warning is logged (100ms)
/// [PERF] Populating a large indexed store is the usual culprit
pub const SYNC_SLOW_THRESHOLD_MS: u64 = 100;

/// Timeout suggested for production callers (60 seconds)
/// Matches the usual fsync budget; the core applies none unless configured
pub const SUGGESTED_SYNC_TIMEOUT: Duration = Duration::from_secs(60);
