//! Error handling for autodoc
//!
//! This module provides the error types and user-friendly error reporting used
//! across the pipeline. The system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell a missing record from a
//!    corrupt cache or a failed warehouse call
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`AutodocError`] - Enumerated error types for every failure case
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! Use [`user_friendly_error`] to convert any [`anyhow::Error`] into an
//! [`ErrorContext`] for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use autodoc_cli::core::{AutodocError, ErrorContext, user_friendly_error};
//!
//! let error = AutodocError::LookupEmpty {
//!     table_suffix: "fr01".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for autodoc operations
///
/// # Error Categories
///
/// ## Parameter cache
/// - [`CacheNotFound`] - No cache file exists where one is required
/// - [`CacheCorrupt`] - The cache file exists but cannot be parsed
/// - [`CacheUnreadable`] - The cache file exists but cannot be read
/// - [`UpdateTargetMissing`] - No record matches the requested country
/// - [`LockTimeout`] - Another process holds the cache lock
///
/// ## Lookups and collaborators
/// - [`LookupEmpty`] - The warehouse returned no model for a table suffix
/// - [`InvalidTableSuffix`] - A suffix that cannot be used in a table name
/// - [`WarehouseError`] - The warehouse call failed
/// - [`IdentityUnavailable`] - The invoking principal could not be resolved
/// - [`CommandNotFound`] / [`CommandFailed`] - External CLI problems
/// - [`StorageError`] - Upload failed
///
/// ## Configuration and rendering
/// - [`RunConfigParseError`] / [`RunConfigInvalid`] - Bad run configuration
/// - [`SettingsError`] - Bad or incomplete settings
/// - [`TemplateError`] - The Word template could not be rendered
///
/// [`CacheNotFound`]: AutodocError::CacheNotFound
/// [`CacheCorrupt`]: AutodocError::CacheCorrupt
/// [`CacheUnreadable`]: AutodocError::CacheUnreadable
/// [`UpdateTargetMissing`]: AutodocError::UpdateTargetMissing
/// [`LockTimeout`]: AutodocError::LockTimeout
/// [`LookupEmpty`]: AutodocError::LookupEmpty
/// [`InvalidTableSuffix`]: AutodocError::InvalidTableSuffix
/// [`WarehouseError`]: AutodocError::WarehouseError
/// [`IdentityUnavailable`]: AutodocError::IdentityUnavailable
/// [`CommandNotFound`]: AutodocError::CommandNotFound
/// [`CommandFailed`]: AutodocError::CommandFailed
/// [`StorageError`]: AutodocError::StorageError
/// [`RunConfigParseError`]: AutodocError::RunConfigParseError
/// [`RunConfigInvalid`]: AutodocError::RunConfigInvalid
/// [`SettingsError`]: AutodocError::SettingsError
/// [`TemplateError`]: AutodocError::TemplateError
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutodocError {
    /// Parameter cache file does not exist
    #[error("Parameter cache not found: {path}")]
    CacheNotFound {
        /// Path where the cache was expected
        path: String,
    },

    /// Parameter cache file exists but is malformed
    ///
    /// This is never recovered by rebuilding: the file may hold edits that a
    /// rebuild would silently discard.
    #[error("Parameter cache is corrupt: {path}")]
    CacheCorrupt {
        /// Path of the malformed cache file
        path: String,
        /// Parser message
        reason: String,
    },

    /// Parameter cache file exists but cannot be read
    #[error("Cannot read parameter cache: {path}")]
    CacheUnreadable {
        /// Path of the unreadable cache file
        path: String,
        /// Underlying I/O message
        reason: String,
    },

    /// No record in the cache matches the country
    #[error("No parameter record for country '{country}'")]
    UpdateTargetMissing {
        /// Country that was requested
        country: String,
    },

    /// Timed out waiting for the cache lock
    #[error("Timeout acquiring cache lock for {path} after {timeout_secs}s")]
    LockTimeout {
        /// Cache file path being locked
        path: String,
        /// Timeout that elapsed
        timeout_secs: u64,
    },

    /// The warehouse returned no model name for a table suffix
    #[error("No model name found in the warehouse for table suffix '{table_suffix}'")]
    LookupEmpty {
        /// Table suffix that was queried
        table_suffix: String,
    },

    /// A table suffix that cannot be interpolated into a table name
    #[error("Invalid table suffix '{suffix}'")]
    InvalidTableSuffix {
        /// The rejected suffix
        suffix: String,
    },

    /// Warehouse request failed
    #[error("Warehouse {operation} failed: {reason}")]
    WarehouseError {
        /// What was being done (e.g., "query")
        operation: String,
        /// Error reported by the warehouse or transport
        reason: String,
    },

    /// The invoking principal could not be determined
    #[error("Unable to resolve the current account: {reason}")]
    IdentityUnavailable {
        /// Why resolution failed
        reason: String,
    },

    /// External command not available
    #[error("Command '{command}' is not installed or not found in PATH")]
    CommandNotFound {
        /// Name of the missing executable
        command: String,
    },

    /// External command returned a failure
    #[error("Command '{command}' failed: {stderr}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// Object storage upload failed
    #[error("Failed to upload '{object}' to bucket '{bucket}': {reason}")]
    StorageError {
        /// Destination bucket
        bucket: String,
        /// Destination object name
        object: String,
        /// Error reported by the storage service or transport
        reason: String,
    },

    /// Run configuration could not be parsed
    #[error("Invalid run configuration syntax in {file}")]
    RunConfigParseError {
        /// Path to the run configuration
        file: String,
        /// Parser message
        reason: String,
    },

    /// Run configuration parsed but failed validation
    #[error("Run configuration validation failed: {reason}")]
    RunConfigInvalid {
        /// What is wrong with it
        reason: String,
    },

    /// Settings error
    #[error("Settings error: {message}")]
    SettingsError {
        /// Description of the problem
        message: String,
    },

    /// Word template could not be rendered
    #[error("Failed to render document template {template}")]
    TemplateError {
        /// Template path
        template: String,
        /// Renderer message
        reason: String,
    },

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: AutodocError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: AutodocError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`AutodocError`] anywhere in the chain, then I/O and YAML errors,
/// and falls back to a generic context carrying the full error chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(autodoc_error) = error.chain().find_map(|e| e.downcast_ref::<AutodocError>()) {
        return create_error_context(autodoc_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AutodocError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership and permissions of the working directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AutodocError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(AutodocError::RunConfigParseError {
            file: "run configuration".to_string(),
            reason: yaml_error.to_string(),
        })
        .with_suggestion("Check the YAML syntax: indentation, quotes and list markers");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AutodocError::Other {
        message,
    })
}

/// Map each [`AutodocError`] variant to details and suggestions.
fn create_error_context(error: AutodocError) -> ErrorContext {
    match &error {
        AutodocError::CacheNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'autodoc prepare' to build the parameter cache first"),

        AutodocError::CacheCorrupt { path, reason } => {
            let details = format!("Parser reported: {reason}");
            let suggestion = format!(
                "Fix {path} by hand, or delete it and run 'autodoc prepare' to rebuild it from the run configuration"
            );
            ErrorContext::new(error).with_details(details).with_suggestion(suggestion)
        }

        AutodocError::CacheUnreadable { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the file permissions of the parameter cache")
        }

        AutodocError::UpdateTargetMissing { .. } => ErrorContext::new(error)
            .with_suggestion("Check the country with 'autodoc show', or add it to run_list and rebuild the cache")
            .with_details("Updates only modify existing records; they never create new ones"),

        AutodocError::LockTimeout { .. } => ErrorContext::new(error)
            .with_suggestion("Another autodoc run is using the same parameter cache. Wait for it to finish and retry"),

        AutodocError::LookupEmpty { table_suffix } => {
            let suggestion =
                format!("Check that the warehouse table for suffix '{table_suffix}' exists and has a 'model' column with data");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("The cache is built all-or-nothing: no file was written")
        }

        AutodocError::InvalidTableSuffix { .. } => ErrorContext::new(error)
            .with_suggestion("Table suffixes may only contain letters, digits and underscores"),

        AutodocError::WarehouseError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check project_id, dataset and your credentials ('gcloud auth login')")
        }

        AutodocError::IdentityUnavailable { .. } => ErrorContext::new(error)
            .with_suggestion("Log in with 'gcloud auth login' and set an account with 'gcloud config set account'"),

        AutodocError::CommandNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Install the Google Cloud SDK or set 'gcloud_path' in the settings file"),

        AutodocError::CommandFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Run the command manually to see the full output"),

        AutodocError::StorageError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the bucket name and that your account can write to it, or use --no-upload"),

        AutodocError::RunConfigParseError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the YAML syntax: indentation, quotes and list markers")
        }

        AutodocError::RunConfigInvalid { .. } => ErrorContext::new(error).with_suggestion(
            "Every run_list entry needs country, table_suffix, training_date, version, if_new and cutoff",
        ),

        AutodocError::SettingsError { .. } => ErrorContext::new(error)
            .with_suggestion("Check ~/.autodoc/config.toml or the file passed with --settings"),

        AutodocError::TemplateError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error).with_details(details).with_suggestion(
                "Every {{ field }} must exist in the record (see 'autodoc show'); use {{ field | default(value=\"\") }} for optional ones",
            )
        }

        AutodocError::Other { .. } => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_context_display_includes_details_and_suggestion() {
        let ctx = ErrorContext::new(AutodocError::UpdateTargetMissing {
            country: "DE".to_string(),
        })
        .with_details("details here")
        .with_suggestion("do this");

        let rendered = ctx.to_string();
        assert!(rendered.contains("No parameter record for country 'DE'"));
        assert!(rendered.contains("Details: details here"));
        assert!(rendered.contains("Suggestion: do this"));
    }

    #[test]
    fn test_user_friendly_error_finds_typed_error_behind_context() {
        let err = anyhow::Error::from(AutodocError::CacheCorrupt {
            path: "fulfill_params.json".to_string(),
            reason: "expected value at line 1".to_string(),
        })
        .context("Failed to load parameters");

        let ctx = user_friendly_error(err);
        assert!(matches!(ctx.error, AutodocError::CacheCorrupt { .. }));
        assert!(ctx.suggestion.unwrap().contains("fulfill_params.json"));
    }

    #[test]
    fn test_user_friendly_error_generic_keeps_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("root cause"));
        let err = err.context("outer").unwrap_err();

        let ctx = user_friendly_error(err);
        match ctx.error {
            AutodocError::Other { message } => {
                assert!(message.starts_with("outer"));
                assert!(message.contains("root cause"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
