//! Advisory lock serializing access to a parameter cache file.
//!
//! Every read-modify-write of the cache runs while holding a [`CacheLock`], so
//! two invocations pointed at the same file cannot lose each other's updates.
//! The lock is an OS-level exclusive lock (via `fs4`) on a sibling
//! `<cache>.lock` file and is released when the guard is dropped. The lock
//! file itself is never removed, so every waiter locks the same inode.
//!
//! # Async Safety
//!
//! File operations run in `spawn_blocking` so lock polling never stalls the
//! tokio runtime.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use crate::core::AutodocError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// Exclusive lock guarding one cache file.
///
/// ```rust,no_run
/// use autodoc_cli::params::CacheLock;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let _lock = CacheLock::acquire(Path::new("fulfill_params.json"), Duration::from_secs(30)).await?;
/// // read, modify and write the cache...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CacheLock {
    /// The file handle - lock is released when this is dropped
    _file: Arc<File>,
    /// Path to the lock file for tracing
    lock_path: PathBuf,
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        debug!(lock = %self.lock_path.display(), "Cache lock released");
    }
}

impl CacheLock {
    /// Path of the lock file guarding `cache_path`.
    #[must_use]
    pub fn lock_path_for(cache_path: &Path) -> PathBuf {
        let mut name = cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache".into());
        name.push(".lock");
        cache_path.with_file_name(name)
    }

    /// Acquires the lock for `cache_path`, waiting up to `timeout`.
    ///
    /// Uses non-blocking lock attempts with exponential backoff, capped at
    /// [`MAX_BACKOFF_DELAY_MS`].
    ///
    /// # Errors
    ///
    /// - The lock file cannot be created
    /// - [`AutodocError::LockTimeout`] if another holder keeps the lock past `timeout`
    pub async fn acquire(cache_path: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = Self::lock_path_for(cache_path);
        debug!(lock = %lock_path.display(), "Waiting for cache lock");

        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create directory for lock file: {}", parent.display())
            })?;
        }

        let open_path = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).write(true).truncate(false).open(&open_path)
        })
        .await
        .with_context(|| "spawn_blocking panicked")?
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        let file = Arc::new(file);
        let start = std::time::Instant::now();

        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        for delay in backoff {
            let file_clone = Arc::clone(&file);
            let lock_result = tokio::task::spawn_blocking(move || file_clone.try_lock_exclusive())
                .await
                .with_context(|| "spawn_blocking panicked")?;

            match lock_result {
                Ok(true) => {
                    debug!(
                        lock = %lock_path.display(),
                        wait_ms = start.elapsed().as_millis(),
                        "Cache lock acquired"
                    );
                    return Ok(Self {
                        _file: file,
                        lock_path,
                    });
                }
                Ok(false) | Err(_) => {
                    let remaining = timeout.saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        break;
                    }
                    tokio::time::sleep(delay.min(remaining)).await;
                }
            }
        }

        Err(AutodocError::LockTimeout {
            path: cache_path.display().to_string(),
            timeout_secs: timeout.as_secs(),
        }
        .into())
    }
}
