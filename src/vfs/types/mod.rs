/*!
 * VFS Types
 * Shared types for filesystem primitives with modern serde patterns
 */

mod analysis;
mod backend;
mod errors;
mod file_type;

pub use analysis::PathAnalysis;
pub use backend::{MountOptions, PersistenceBackend};
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
