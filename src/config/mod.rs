//! Configuration for autodoc.
//!
//! Two files drive a run:
//!
//! 1. **Settings** (`~/.autodoc/config.toml`) - where things live: cloud
//!    project, dataset, bucket, cache and template paths. See [`settings`].
//! 2. **Run configuration** (`run_config.yaml`) - what to document: the shared
//!    `fulfill_template` and the ordered per-country `run_list`. See
//!    [`run_config`].

pub mod run_config;
pub mod settings;

pub use run_config::{RunConfig, RunEntry, is_valid_table_suffix};
pub use settings::Settings;
