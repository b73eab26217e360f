//! Narrow interfaces to the external systems the pipeline calls.
//!
//! The cache logic only needs three things from the outside world: distinct
//! model names per table suffix, the account of whoever runs the build, and a
//! place to upload rendered files. Each is a trait so the production clients
//! (BigQuery, `gcloud`, Cloud Storage) can be swapped for fakes in tests.
//!
//! Errors from these calls are propagated unchanged; no retry happens here.
//!
//! # Implementations
//!
//! - [`bigquery::BigQueryWarehouse`] - BigQuery `jobs.query` over REST
//! - [`gcloud::GcloudIdentity`] - active `gcloud` account
//! - [`storage::GcsStorage`] - Cloud Storage media upload
//! - [`storage::LocalStorage`] - copies into a local directory tree

pub mod bigquery;
pub mod gcloud;
pub mod storage;

pub use bigquery::BigQueryWarehouse;
pub use gcloud::{GcloudAuth, GcloudCommand, GcloudIdentity};
pub use storage::{GcsStorage, LocalStorage};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

/// One row of a distinct-model query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRow {
    pub model: String,
}

impl ModelRow {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Query access to the data warehouse.
pub trait Warehouse {
    /// Returns the distinct model names stored in the table for `table_suffix`,
    /// in the order the warehouse returned them.
    fn distinct_models(
        &self,
        table_suffix: &str,
    ) -> impl Future<Output = Result<Vec<ModelRow>>> + Send;
}

/// Resolves the principal running the pipeline.
pub trait Identity {
    /// Account name recorded as `prepared_by`.
    fn current_principal(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Uploads local files to object storage.
pub trait ObjectStorage {
    /// Uploads `local_path` to `bucket` under `remote_path`.
    fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_path: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
