//! Shared setup for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::collaborators::{BigQueryWarehouse, GcloudAuth, GcloudIdentity};
use crate::config::{RunConfig, Settings};
use crate::params::{Cache, CacheBuilder, CacheRead, ParamStore, read_cache};

/// Settings plus the objects every command derives from them.
#[derive(Debug)]
pub struct CommandContext {
    pub settings: Settings,
    /// Shared by the warehouse and storage clients so the token is fetched once
    pub auth: Arc<GcloudAuth>,
}

impl CommandContext {
    pub async fn load(settings_path: Option<PathBuf>) -> Result<Self> {
        let settings = Settings::load_with_optional(settings_path).await?;
        debug!(?settings, "Settings loaded");
        Ok(Self::new(settings))
    }

    pub fn new(settings: Settings) -> Self {
        let auth = Arc::new(GcloudAuth::new(settings.gcloud_path.clone()));
        Self {
            settings,
            auth,
        }
    }

    pub fn store(&self) -> ParamStore {
        ParamStore::new(&self.settings.params_file).with_lock_timeout(self.settings.lock_timeout())
    }

    fn run_config_path<'a>(&'a self, run_config: Option<&'a Path>) -> &'a Path {
        run_config.unwrap_or(&self.settings.run_config)
    }

    /// Returns the cache, building it from the run configuration if needed.
    ///
    /// Without a run configuration file an existing cache is still usable;
    /// only building requires one.
    pub async fn load_or_create_cache(&self, run_config: Option<&Path>) -> Result<(ParamStore, Cache)> {
        let store = self.store();
        let run_config_path = self.run_config_path(run_config);

        if !run_config_path.exists() {
            return match read_cache(store.path()) {
                CacheRead::Found(cache) => Ok((store, cache)),
                CacheRead::Corrupt(err) => Err(err.into()),
                CacheRead::NotFound => Err(anyhow::anyhow!(
                    "Run configuration not found: {}\n\n\
                     It is required to build {} (pass --run-config or set run_config in the settings)",
                    run_config_path.display(),
                    store.path().display()
                )),
            };
        }

        let run_config = RunConfig::load(run_config_path).await?;
        let warehouse = BigQueryWarehouse::from_settings(&self.settings, Arc::clone(&self.auth))?;
        let identity = GcloudIdentity::new(self.settings.gcloud_path.clone());

        let cache = store
            .load_or_create(&run_config, &CacheBuilder::new(&warehouse, &identity))
            .await
            .with_context(|| format!("Failed to prepare parameter cache {}", store.path().display()))?;
        Ok((store, cache))
    }
}
