//! Atomic file write operations using temp-and-rename strategy.
//!
//! The parameter cache is rewritten in full on every update, so a crash in the
//! middle of a write must never leave a truncated JSON document behind.

use crate::utils::fs::dirs::ensure_parent_dir;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Creates a temporary file in the target's directory
/// 2. Writes and syncs the content
/// 3. Renames the temporary file over the target path
///
/// The temporary file lives in the same directory so the rename never crosses
/// filesystems. Parent directories are created when missing. If any step fails
/// the temporary file is removed and the target keeps its previous content.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
