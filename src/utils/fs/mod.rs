//! File system utilities
//!
//! Atomic writes never leave a partially written file at the target path:
//! readers see either the previous content or the new content.
//!
//! ```rust,no_run
//! use autodoc_cli::utils::fs::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("output"))?;
//! atomic_write(Path::new("output/fulfill_params.json"), b"[]")?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod dirs;

pub use atomic::atomic_write;
pub use dirs::{ensure_dir, ensure_parent_dir};
