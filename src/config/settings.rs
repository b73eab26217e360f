//! User settings for the pipeline (`~/.autodoc/config.toml`).
//!
//! ```toml
//! project_id = "analytics-prod"
//! location = "EU"
//! dataset = "model_monitoring"
//! bucket = "model-docs"
//! bucket_folder = "autodoc/2026"
//! params_file = "~/work/fulfill_params.json"
//! doc_template = "$TEMPLATES/for_test.docx"
//! ```
//!
//! Every field is optional. A missing settings file yields the defaults, and
//! `AUTODOC_PROJECT_ID`, `AUTODOC_BUCKET` and `AUTODOC_PARAMS_FILE` override
//! the corresponding values after the file is read.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants::{
    DEFAULT_DOC_TEMPLATE, DEFAULT_MODEL_TABLE_PREFIX, DEFAULT_OUTPUT_PREFIX, DEFAULT_PARAMS_FILE,
    DEFAULT_RUN_CONFIG_FILE,
};
use crate::core::AutodocError;
use crate::utils::platform::{expand_path, get_home_dir};

pub const ENV_PROJECT_ID: &str = "AUTODOC_PROJECT_ID";
pub const ENV_BUCKET: &str = "AUTODOC_BUCKET";
pub const ENV_PARAMS_FILE: &str = "AUTODOC_PARAMS_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cloud project billed for warehouse queries
    pub project_id: Option<String>,
    /// Warehouse location (e.g. `EU`)
    pub location: Option<String>,
    /// Dataset holding the per-country model tables
    pub dataset: Option<String>,
    /// Table name prefix; the table suffix is appended to it
    pub model_table_prefix: String,
    pub bucket: Option<String>,
    /// Folder inside the bucket that receives rendered documents
    pub bucket_folder: String,
    pub params_file: PathBuf,
    pub run_config: PathBuf,
    pub doc_template: PathBuf,
    pub output_dir: PathBuf,
    /// Rendered files are named `{output_prefix}{country}.docx`
    pub output_prefix: String,
    pub lock_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Explicit `gcloud` executable; looked up in `PATH` when unset
    pub gcloud_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_id: None,
            location: None,
            dataset: None,
            model_table_prefix: DEFAULT_MODEL_TABLE_PREFIX.to_string(),
            bucket: None,
            bucket_folder: String::new(),
            params_file: PathBuf::from(DEFAULT_PARAMS_FILE),
            run_config: PathBuf::from(DEFAULT_RUN_CONFIG_FILE),
            doc_template: PathBuf::from(DEFAULT_DOC_TEMPLATE),
            output_dir: PathBuf::from("."),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            lock_timeout_secs: crate::constants::default_lock_timeout().as_secs(),
            request_timeout_secs: crate::constants::default_request_timeout().as_secs(),
            gcloud_path: None,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from [`Settings::default_path`] when `None`.
    ///
    /// A missing file is not an error: defaults are used. Environment
    /// overrides and path expansion are applied in both cases.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        let mut settings = if path.exists() {
            Self::load_from(&path).await?
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Self::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.expand_paths()?;
        Ok(settings)
    }

    /// Parses the settings file at `path` without applying overrides.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid settings TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            AutodocError::SettingsError {
                message: format!("{}: {}", path.display(), e.message()),
            }
            .into()
        })
    }

    /// `~/.autodoc/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_home_dir()?.join(".autodoc").join("config.toml"))
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(project_id) = lookup(ENV_PROJECT_ID) {
            self.project_id = Some(project_id);
        }
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket = Some(bucket);
        }
        if let Some(params_file) = lookup(ENV_PARAMS_FILE) {
            self.params_file = PathBuf::from(params_file);
        }
    }

    /// Expands `~` and environment variables in every path field.
    pub fn expand_paths(&mut self) -> Result<()> {
        for path in [
            &mut self.params_file,
            &mut self.run_config,
            &mut self.doc_template,
            &mut self.output_dir,
        ] {
            *path = expand_path(&path.to_string_lossy())?;
        }
        if let Some(gcloud) = self.gcloud_path.as_mut() {
            *gcloud = expand_path(&gcloud.to_string_lossy())?;
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the project id or a settings error naming the missing key.
    pub fn require_project_id(&self) -> Result<&str, AutodocError> {
        require(self.project_id.as_deref(), "project_id", ENV_PROJECT_ID)
    }

    /// Returns the dataset or a settings error naming the missing key.
    pub fn require_dataset(&self) -> Result<&str, AutodocError> {
        require(self.dataset.as_deref(), "dataset", "")
    }

    /// Returns the bucket or a settings error naming the missing key.
    pub fn require_bucket(&self) -> Result<&str, AutodocError> {
        require(self.bucket.as_deref(), "bucket", ENV_BUCKET)
    }
}

fn require<'a>(value: Option<&'a str>, key: &str, env: &str) -> Result<&'a str, AutodocError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ if env.is_empty() => Err(AutodocError::SettingsError {
            message: format!("'{key}' is not set"),
        }),
        _ => Err(AutodocError::SettingsError {
            message: format!("'{key}' is not set (configure it or export {env})"),
        }),
    }
}
