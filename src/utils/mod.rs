//! Filesystem and platform helpers
//!
//! - [`fs`] - Atomic writes and directory creation
//! - [`platform`] - Path expansion and executable lookup

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, ensure_dir, ensure_parent_dir};
pub use platform::{expand_path, locate_command};
