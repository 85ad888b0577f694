/*!
 * Storage Root Management
 * Path normalization, directory ensuring and the mount/sync lifecycle
 */

pub mod config;
pub mod ensure;
pub mod errors;
pub mod paths;
pub mod root;

pub use config::{HostEnvironment, StorageConfig};
pub use ensure::ensure_create_dir;
pub use errors::{FsOperation, StorageError, StorageResult};
pub use paths::{materialize, validate, RootPath};
pub use root::{MountBinding, StorageManager};
