//! autodoc - per-country model documentation
//!
//! Fills a Word template once per country with model metadata and uploads the
//! results to cloud storage. Parameters are assembled once into a JSON cache
//! (`fulfill_params.json`) that humans and later steps may edit, so rendering
//! never depends on the warehouse being reachable.
//!
//! # Flow
//!
//! 1. [`config::RunConfig`] lists the countries, each with a table suffix and
//!    overrides, plus a shared template whose text values may contain the
//!    `RUN_SUFFIX` sentinel.
//! 2. [`params::ParamStore::load_or_create`] returns the cache, building it
//!    with [`params::CacheBuilder`] if the file does not exist: one record per
//!    country with the model name from the warehouse, the current account and
//!    today's date, the sentinel replaced by the table suffix.
//! 3. [`pipeline::Pipeline::render_all`] renders one `.docx` per record and
//!    writes the file name back into the cache.
//! 4. [`pipeline::Pipeline::upload_all`] uploads the documents.
//!
//! # Modules
//!
//! - [`cli`] - `autodoc` subcommands
//! - [`collaborators`] - Warehouse, identity and storage traits with their
//!   BigQuery, `gcloud` and Cloud Storage implementations
//! - [`config`] - Settings file and run configuration
//! - [`core`] - Error types and user-facing error formatting
//! - [`document`] - `.docx` rendering
//! - [`params`] - Records, the cache file, its lock and the builder
//! - [`pipeline`] - Render and upload orchestration
//! - [`utils`] - Filesystem and platform helpers

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod core;
pub mod document;
pub mod params;
pub mod pipeline;
pub mod utils;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
