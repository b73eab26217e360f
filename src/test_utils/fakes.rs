//! In-memory collaborators that record how they were called.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collaborators::{Identity, ModelRow, ObjectStorage, Warehouse};

/// Warehouse answering from a fixed suffix → models table.
///
/// Unknown suffixes return no rows.
#[derive(Debug, Default)]
pub struct FakeWarehouse {
    models: HashMap<String, Vec<String>>,
    failure: Option<String>,
    queried: Mutex<Vec<String>>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned for `table_suffix`, in order.
    #[must_use]
    pub fn with_models(mut self, table_suffix: &str, models: &[&str]) -> Self {
        self.models
            .insert(table_suffix.to_string(), models.iter().map(|m| (*m).to_string()).collect());
        self
    }

    /// Makes every query fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Table suffixes queried so far, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Warehouse for FakeWarehouse {
    async fn distinct_models(&self, table_suffix: &str) -> Result<Vec<ModelRow>> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(table_suffix.to_string());
        }
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }
        Ok(self
            .models
            .get(table_suffix)
            .map(|models| models.iter().map(ModelRow::new).collect())
            .unwrap_or_default())
    }
}

/// Identity returning a fixed principal and counting lookups.
#[derive(Debug)]
pub struct FakeIdentity {
    principal: String,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new(principal: &str) -> Self {
        Self {
            principal: principal.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Identity for FakeIdentity {
    async fn current_principal(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.principal.clone())
    }
}

/// One recorded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub local_path: PathBuf,
    pub bucket: String,
    pub remote_path: String,
}

/// Storage that records uploads instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingStorage {
    uploads: Mutex<Vec<Upload>>,
    failure: Option<String>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl ObjectStorage for RecordingStorage {
    async fn upload(&self, local_path: &Path, bucket: &str, remote_path: &str) -> Result<()> {
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(Upload {
                local_path: local_path.to_path_buf(),
                bucket: bucket.to_string(),
                remote_path: remote_path.to_string(),
            });
        }
        Ok(())
    }
}
