//! Reading and writing the parameter cache file.
//!
//! Reading never uses errors for control flow: [`read_cache`] returns a
//! [`CacheRead`] that tells an absent file apart from a corrupt one, and only
//! the absent case is meant to trigger a rebuild.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::core::AutodocError;
use crate::params::Cache;
use crate::utils::fs::atomic_write;

/// Outcome of reading a cache file.
#[derive(Debug)]
pub enum CacheRead {
    /// The file exists and holds a valid cache
    Found(Cache),
    /// There is no file; the caller may build one
    NotFound,
    /// The file exists but could not be read or parsed
    Corrupt(AutodocError),
}

/// Reads the cache at `path`.
///
/// - Missing file → [`CacheRead::NotFound`]
/// - Unreadable file → [`CacheRead::Corrupt`] with [`AutodocError::CacheUnreadable`]
/// - Empty or whitespace-only file, invalid JSON, wrong shape, or a country
///   listed twice →
///   [`CacheRead::Corrupt`] with [`AutodocError::CacheCorrupt`]
pub fn read_cache(path: &Path) -> CacheRead {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Parameter cache does not exist");
            return CacheRead::NotFound;
        }
        Err(e) => {
            return CacheRead::Corrupt(AutodocError::CacheUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };

    if content.trim().is_empty() {
        return CacheRead::Corrupt(AutodocError::CacheCorrupt {
            path: path.display().to_string(),
            reason: "file is empty".to_string(),
        });
    }

    let cache: Cache = match serde_json::from_str(&content) {
        Ok(cache) => cache,
        Err(e) => {
            return CacheRead::Corrupt(AutodocError::CacheCorrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };

    if let Some(country) = cache.duplicate_country() {
        return CacheRead::Corrupt(AutodocError::CacheCorrupt {
            path: path.display().to_string(),
            reason: format!("country '{country}' appears more than once"),
        });
    }

    debug!(path = %path.display(), records = cache.len(), "Parameter cache loaded");
    CacheRead::Found(cache)
}

/// Serializes `cache` as pretty JSON and writes it atomically to `path`.
///
/// # Errors
///
/// Fails if serialization fails or the file cannot be written; the previous
/// content of `path` is left intact in that case.
pub fn write_cache(cache: &Cache, path: &Path) -> Result<()> {
    let mut content =
        serde_json::to_string_pretty(cache).context("Failed to serialize parameter cache")?;
    content.push('\n');

    atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to write parameter cache: {}", path.display()))?;

    debug!(path = %path.display(), records = cache.len(), "Parameter cache written");
    Ok(())
}
