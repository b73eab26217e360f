//! Global constants used throughout the autodoc codebase.
//!
//! This module contains the fixed tokens, default file names, timeouts and
//! retry parameters shared across modules.

use std::time::Duration;

/// Marker embedded in template values that is replaced by a country's table suffix.
pub const SENTINEL_TOKEN: &str = "RUN_SUFFIX";

/// Default name of the parameter cache file.
pub const DEFAULT_PARAMS_FILE: &str = "fulfill_params.json";

/// Default name of the run configuration file.
pub const DEFAULT_RUN_CONFIG_FILE: &str = "run_config.yaml";

/// Default Word template used for rendering.
pub const DEFAULT_DOC_TEMPLATE: &str = "for_test.docx";

/// Prefix of every rendered document file name (`{prefix}{country}.docx`).
pub const DEFAULT_OUTPUT_PREFIX: &str = "file_to_fill_";

/// Prefix of the per-country warehouse table (`{dataset}.{prefix}{suffix}`).
pub const DEFAULT_MODEL_TABLE_PREFIX: &str = "table_";

/// Format of the `date_last_updated` field.
pub const DATE_LAST_UPDATED_FORMAT: &str = "%d/%m/%Y";

/// Data keys written by the cache builder.
pub mod fields {
    /// Model name looked up in the warehouse.
    pub const NAME: &str = "name";
    /// Account of the principal that built the cache.
    pub const PREPARED_BY: &str = "prepared_by";
    /// Build date in `DD/MM/YYYY`.
    pub const DATE_LAST_UPDATED: &str = "date_last_updated";
    pub const TRAINING_DATE: &str = "training_date";
    pub const VERSION: &str = "version";
    pub const IF_NEW: &str = "if_new";
    pub const COUNTRY: &str = "country";
    /// The country's table suffix.
    pub const SUFFIX_MAIN: &str = "suffix_main";
    pub const CUTOFF: &str = "cutoff";
    /// File name of the last rendered document, attached after rendering.
    pub const DOCUMENT_FILE: &str = "document_file";
}

/// Default timeout for acquiring the cache lock (30 seconds).
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default timeout for warehouse and storage HTTP requests (120 seconds).
pub fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Timeout for `gcloud` invocations (30 seconds).
pub const GCLOUD_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Server-side wait for a BigQuery `jobs.query` call, in milliseconds.
pub const BIGQUERY_QUERY_TIMEOUT_MS: u64 = 60_000;

/// MIME type of rendered `.docx` files.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
