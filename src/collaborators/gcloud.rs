//! Running the `gcloud` CLI: active account and access tokens.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::collaborators::Identity;
use crate::constants::GCLOUD_COMMAND_TIMEOUT;
use crate::core::AutodocError;
use crate::utils::platform::locate_command;

/// Builder for a single `gcloud` invocation.
///
/// ```rust,ignore
/// let account = GcloudCommand::new()
///     .args(["config", "list", "account", "--format", "value(core.account)"])
///     .with_context("Resolving active account")
///     .execute_stdout()
///     .await?;
/// ```
pub struct GcloudCommand {
    args: Vec<String>,
    /// Explicit executable; `gcloud` from `PATH` otherwise
    program: Option<PathBuf>,
    timeout_duration: Duration,
    context: Option<String>,
}

impl Default for GcloudCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            program: None,
            timeout_duration: GCLOUD_COMMAND_TIMEOUT,
            context: None,
        }
    }
}

impl GcloudCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// `gcloud config list account --format value(core.account)`
    pub fn active_account() -> Self {
        Self::new().args(["config", "list", "account", "--format", "value(core.account)"])
    }

    /// `gcloud auth print-access-token`
    pub fn print_access_token() -> Self {
        Self::new().args(["auth", "print-access-token"])
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(mut self, program: Option<PathBuf>) -> Self {
        self.program = program;
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Runs the command and returns its trimmed stdout.
    ///
    /// # Errors
    ///
    /// - [`AutodocError::CommandNotFound`] if the executable cannot be located
    /// - [`AutodocError::CommandFailed`] on a non-zero exit or a timeout
    pub async fn execute_stdout(self) -> Result<String> {
        let program = locate_command("gcloud", self.program.as_deref())?;
        let command_line = format!("gcloud {}", self.args.join(" "));

        match &self.context {
            Some(ctx) => tracing::debug!(target: "gcloud", "({}) Executing command: {}", ctx, command_line),
            None => tracing::debug!(target: "gcloud", "Executing command: {}", command_line),
        }

        let mut cmd = Command::new(&program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout_duration, cmd.output()).await {
            Ok(result) => result.with_context(|| format!("Failed to execute {command_line}"))?,
            Err(_) => {
                tracing::warn!(
                    target: "gcloud",
                    "Command timed out after {} seconds: {}",
                    self.timeout_duration.as_secs(),
                    command_line
                );
                return Err(AutodocError::CommandFailed {
                    command: command_line,
                    stderr: format!("timed out after {}s", self.timeout_duration.as_secs()),
                }
                .into());
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AutodocError::CommandFailed {
                command: command_line,
                stderr,
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// First line of `output` that is not blank, trimmed.
fn first_non_empty_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Reads the active account from the `gcloud` configuration.
#[derive(Debug, Clone, Default)]
pub struct GcloudIdentity {
    gcloud_path: Option<PathBuf>,
}

impl GcloudIdentity {
    pub fn new(gcloud_path: Option<PathBuf>) -> Self {
        Self {
            gcloud_path,
        }
    }
}

impl Identity for GcloudIdentity {
    async fn current_principal(&self) -> Result<String> {
        let stdout = GcloudCommand::active_account()
            .program(self.gcloud_path.clone())
            .with_context("Resolving active account")
            .execute_stdout()
            .await?;

        first_non_empty_line(&stdout).map(str::to_string).ok_or_else(|| {
            AutodocError::IdentityUnavailable {
                reason: "no active gcloud account (run `gcloud auth login`)".to_string(),
            }
            .into()
        })
    }
}

/// Bearer tokens from `gcloud auth print-access-token`, fetched once per process.
#[derive(Debug, Default)]
pub struct GcloudAuth {
    gcloud_path: Option<PathBuf>,
    token: OnceCell<String>,
}

impl GcloudAuth {
    pub fn new(gcloud_path: Option<PathBuf>) -> Self {
        Self {
            gcloud_path,
            token: OnceCell::new(),
        }
    }

    /// Returns the cached access token, running `gcloud` on first use.
    pub async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let stdout = GcloudCommand::print_access_token()
                    .program(self.gcloud_path.clone())
                    .with_context("Fetching access token")
                    .execute_stdout()
                    .await?;
                first_non_empty_line(&stdout).map(str::to_string).ok_or_else(|| {
                    anyhow::Error::from(AutodocError::IdentityUnavailable {
                        reason: "gcloud returned an empty access token".to_string(),
                    })
                })
            })
            .await?;
        Ok(token.as_str())
    }
}
