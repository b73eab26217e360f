//! BigQuery warehouse client (`jobs.query` over REST).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::collaborators::gcloud::GcloudAuth;
use crate::collaborators::{ModelRow, Warehouse};
use crate::config::{Settings, is_valid_table_suffix};
use crate::constants::BIGQUERY_QUERY_TIMEOUT_MS;
use crate::core::AutodocError;

const BIGQUERY_API: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Standard SQL listing the distinct models of one country table.
///
/// # Errors
///
/// [`AutodocError::InvalidTableSuffix`] if `table_suffix` is not a plain
/// identifier fragment.
pub fn distinct_model_sql(
    dataset: &str,
    table_prefix: &str,
    table_suffix: &str,
) -> Result<String, AutodocError> {
    if !is_valid_table_suffix(table_suffix) {
        return Err(AutodocError::InvalidTableSuffix {
            suffix: table_suffix.to_string(),
        });
    }
    Ok(format!("SELECT DISTINCT model FROM `{dataset}.{table_prefix}{table_suffix}`"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    rows: Vec<TableRow>,
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Decodes the first column of every row, in the order returned.
///
/// Null cells are skipped. Only the synchronous `jobs.query` answer is read:
/// a job still running when the request timeout expires is an error (there is
/// no `getQueryResults` polling), and when the answer carries a `pageToken`
/// only the first page is used and a warning is logged. A `SELECT DISTINCT`
/// over one column of a model table fits in that first page.
pub fn parse_query_response(body: &str) -> Result<Vec<ModelRow>, AutodocError> {
    let response: QueryResponse =
        serde_json::from_str(body).map_err(|e| AutodocError::WarehouseError {
            operation: "query".to_string(),
            reason: format!("unexpected response: {e}"),
        })?;

    if !response.job_complete {
        return Err(AutodocError::WarehouseError {
            operation: "query".to_string(),
            reason: "the query did not complete before the timeout".to_string(),
        });
    }

    if response.page_token.is_some() {
        warn!(
            rows = response.rows.len(),
            "Query result spans several pages, only the first one is read"
        );
    }

    Ok(response
        .rows
        .into_iter()
        .filter_map(|row| row.f.into_iter().next().and_then(|cell| cell.v))
        .map(ModelRow::new)
        .collect())
}

/// Extracts `error.message` from an API error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Queries model tables `{dataset}.{model_table_prefix}{table_suffix}`.
pub struct BigQueryWarehouse {
    client: reqwest::Client,
    auth: Arc<GcloudAuth>,
    project_id: Option<String>,
    location: Option<String>,
    dataset: Option<String>,
    table_prefix: String,
}

impl BigQueryWarehouse {
    /// Creates a client from settings; missing keys are reported on first query.
    pub fn from_settings(settings: &Settings, auth: Arc<GcloudAuth>) -> Result<Self> {
        Ok(Self {
            client: http_client(settings.request_timeout())?,
            auth,
            project_id: settings.project_id.clone(),
            location: settings.location.clone(),
            dataset: settings.dataset.clone(),
            table_prefix: settings.model_table_prefix.clone(),
        })
    }

    fn missing(key: &str) -> AutodocError {
        AutodocError::SettingsError {
            message: format!("'{key}' must be set to query the warehouse"),
        }
    }
}

/// Shared `reqwest` client configuration for the cloud APIs.
pub(crate) fn http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("autodoc/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

impl Warehouse for BigQueryWarehouse {
    async fn distinct_models(&self, table_suffix: &str) -> Result<Vec<ModelRow>> {
        let project_id = self.project_id.as_deref().ok_or_else(|| Self::missing("project_id"))?;
        let dataset = self.dataset.as_deref().ok_or_else(|| Self::missing("dataset"))?;
        let sql = distinct_model_sql(dataset, &self.table_prefix, table_suffix)?;
        debug!(table_suffix, %sql, "Querying warehouse");

        let token = self.auth.access_token().await?;
        let request = QueryRequest {
            query: &sql,
            use_legacy_sql: false,
            timeout_ms: BIGQUERY_QUERY_TIMEOUT_MS,
            location: self.location.as_deref(),
        };

        let response = self
            .client
            .post(format!("{BIGQUERY_API}/projects/{project_id}/queries"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AutodocError::WarehouseError {
                operation: "query".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AutodocError::WarehouseError {
            operation: "query".to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(AutodocError::WarehouseError {
                operation: "query".to_string(),
                reason: format!("HTTP {status}: {}", api_error_message(&body)),
            }
            .into());
        }

        let rows = parse_query_response(&body)?;
        debug!(table_suffix, rows = rows.len(), "Warehouse query returned");
        Ok(rows)
    }
}
