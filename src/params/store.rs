//! Entry points for loading, building and updating a cache file.
//!
//! Every read-modify-write runs under a [`CacheLock`] on the cache path, so
//! concurrent invocations against the same file serialize instead of losing
//! each other's changes.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::collaborators::{Identity, Warehouse};
use crate::config::RunConfig;
use crate::constants::default_lock_timeout;
use crate::core::AutodocError;
use crate::params::builder::CacheBuilder;
use crate::params::io::{CacheRead, read_cache, write_cache};
use crate::params::lock::CacheLock;
use crate::params::value::ParamMap;
use crate::params::{Cache, UpdateOutcome};

/// A parameter cache at a fixed path.
///
/// ```rust,no_run
/// use autodoc_cli::params::{CacheBuilder, ParamStore};
/// # use autodoc_cli::collaborators::{Identity, Warehouse};
/// # use autodoc_cli::config::RunConfig;
///
/// # async fn example(w: &impl Warehouse, i: &impl Identity, run: &RunConfig) -> anyhow::Result<()> {
/// let store = ParamStore::new("fulfill_params.json");
/// let mut cache = store.load_or_create(run, &CacheBuilder::new(w, i)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ParamStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl ParamStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: default_lock_timeout(),
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cache on disk, building and persisting it first if absent.
    ///
    /// An existing, valid file is returned as is: the run configuration is not
    /// consulted and no collaborator is called. A corrupt file is an error and
    /// is never rebuilt. If the build fails nothing is written.
    pub async fn load_or_create<W, I>(
        &self,
        run_config: &RunConfig,
        builder: &CacheBuilder<'_, W, I>,
    ) -> Result<Cache>
    where
        W: Warehouse,
        I: Identity,
    {
        let _lock = CacheLock::acquire(&self.path, self.lock_timeout).await?;

        match read_cache(&self.path) {
            CacheRead::Found(cache) => {
                info!(path = %self.path.display(), records = cache.len(), "Using existing parameter cache");
                Ok(cache)
            }
            CacheRead::Corrupt(err) => Err(err.into()),
            CacheRead::NotFound => {
                info!(path = %self.path.display(), "Parameter cache not found, building it");
                let cache = builder.build(run_config).await?;
                write_cache(&cache, &self.path)?;
                info!(path = %self.path.display(), records = cache.len(), "Parameter cache created");
                Ok(cache)
            }
        }
    }

    /// Reads the cache without building it.
    ///
    /// # Errors
    ///
    /// [`AutodocError::CacheNotFound`] if there is no cache yet, or the
    /// corruption error if the file cannot be parsed.
    pub fn load(&self) -> Result<Cache> {
        match read_cache(&self.path) {
            CacheRead::Found(cache) => Ok(cache),
            CacheRead::NotFound => Err(AutodocError::CacheNotFound {
                path: self.path.display().to_string(),
            }
            .into()),
            CacheRead::Corrupt(err) => Err(err.into()),
        }
    }

    /// Merges `patch` into the record for `country` and persists the cache.
    ///
    /// The file is re-read under the lock and the patch is applied to that
    /// copy, so changes made by other invocations since `cache` was loaded are
    /// kept; `cache` is then replaced by what was written. Without a file the
    /// in-memory cache is the base.
    ///
    /// When no record matches, `cache` is left untouched, nothing is written
    /// and [`UpdateOutcome::NotFound`] is returned. On a write failure `cache`
    /// is also left untouched.
    pub async fn update(
        &self,
        cache: &mut Cache,
        country: &str,
        patch: &ParamMap,
    ) -> Result<UpdateOutcome> {
        if cache.get(country).is_none() {
            debug!(country, "No parameter record to update");
            return Ok(UpdateOutcome::NotFound);
        }

        let _lock = CacheLock::acquire(&self.path, self.lock_timeout).await?;
        let mut current = match read_cache(&self.path) {
            CacheRead::Found(on_disk) => on_disk,
            CacheRead::NotFound => cache.clone(),
            CacheRead::Corrupt(err) => return Err(err.into()),
        };

        let outcome = current.apply_patch(country, patch);
        if outcome == UpdateOutcome::NotFound {
            debug!(country, path = %self.path.display(), "Record no longer in the cache file");
            return Ok(outcome);
        }

        write_cache(&current, &self.path)?;
        *cache = current;

        debug!(country, fields = patch.len(), "Parameter record updated");
        Ok(outcome)
    }

    /// Re-reads the file under the lock, patches one record and writes it back.
    ///
    /// For callers without an in-memory cache, such as `autodoc set`.
    pub async fn update_on_disk(&self, country: &str, patch: &ParamMap) -> Result<UpdateOutcome> {
        let _lock = CacheLock::acquire(&self.path, self.lock_timeout).await?;

        let mut cache = match read_cache(&self.path) {
            CacheRead::Found(cache) => cache,
            CacheRead::NotFound => {
                return Err(AutodocError::CacheNotFound {
                    path: self.path.display().to_string(),
                }
                .into());
            }
            CacheRead::Corrupt(err) => return Err(err.into()),
        };

        let outcome = cache.apply_patch(country, patch);
        if outcome == UpdateOutcome::Updated {
            write_cache(&cache, &self.path)?;
            debug!(country, fields = patch.len(), "Parameter record updated on disk");
        }
        Ok(outcome)
    }
}
