/*!
 * Core Module
 * Shared limits and constants
 */

pub mod limits;

pub use limits::*;
