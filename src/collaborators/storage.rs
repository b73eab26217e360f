//! Uploading rendered documents.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::collaborators::ObjectStorage;
use crate::collaborators::bigquery::http_client;
use crate::collaborators::gcloud::GcloudAuth;
use crate::config::Settings;
use crate::constants::DOCX_MIME_TYPE;
use crate::core::AutodocError;
use crate::utils::fs::ensure_parent_dir;

const GCS_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Object name for `file_name` inside `folder`.
///
/// Slashes around `folder` are ignored; an empty folder yields the bare file name.
pub fn object_name(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{folder}/{file_name}")
    }
}

/// Cloud Storage client using the JSON API's simple media upload.
pub struct GcsStorage {
    client: reqwest::Client,
    auth: Arc<GcloudAuth>,
}

impl GcsStorage {
    pub fn from_settings(settings: &Settings, auth: Arc<GcloudAuth>) -> Result<Self> {
        Ok(Self {
            client: http_client(settings.request_timeout())?,
            auth,
        })
    }
}

impl ObjectStorage for GcsStorage {
    async fn upload(&self, local_path: &Path, bucket: &str, remote_path: &str) -> Result<()> {
        let storage_error = |reason: String| AutodocError::StorageError {
            bucket: bucket.to_string(),
            object: remote_path.to_string(),
            reason,
        };

        let body = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read {}", local_path.display()))?;
        let token = self.auth.access_token().await?;

        debug!(bucket, object = remote_path, bytes = body.len(), "Uploading to Cloud Storage");
        let response = self
            .client
            .post(format!("{GCS_UPLOAD_API}/b/{bucket}/o"))
            .query(&[("uploadType", "media"), ("name", remote_path)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, DOCX_MIME_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| storage_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(storage_error(format!("HTTP {status}: {}", text.trim())).into());
        }
        Ok(())
    }
}

/// Stores uploads under `{root}/{bucket}/{remote_path}` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Where an upload of `remote_path` to `bucket` ends up.
    pub fn destination(&self, bucket: &str, remote_path: &str) -> PathBuf {
        remote_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.join(bucket), |path, part| path.join(part))
    }
}

impl ObjectStorage for LocalStorage {
    async fn upload(&self, local_path: &Path, bucket: &str, remote_path: &str) -> Result<()> {
        if remote_path.split('/').any(|part| part == "..") {
            return Err(AutodocError::StorageError {
                bucket: bucket.to_string(),
                object: remote_path.to_string(),
                reason: "object names may not contain '..'".to_string(),
            }
            .into());
        }

        let destination = self.destination(bucket, remote_path);
        ensure_parent_dir(&destination)?;
        tokio::fs::copy(local_path, &destination).await.with_context(|| {
            format!("Failed to copy {} to {}", local_path.display(), destination.display())
        })?;
        debug!(destination = %destination.display(), "Stored locally");
        Ok(())
    }
}
