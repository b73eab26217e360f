//! Command-line interface for autodoc.
//!
//! ```bash
//! autodoc prepare                          # build fulfill_params.json if missing
//! autodoc set FR cutoff=0.9 if_new=false   # patch one country's record
//! autodoc show --country FR --format json  # inspect the cache
//! autodoc render                           # render every document and upload it
//! autodoc render --local-upload ./out      # copy into ./out/<bucket>/... instead
//! ```
//!
//! Global options (`--verbose`, `--quiet`, `--settings`) apply to every
//! subcommand. Logs go to stderr so command output on stdout stays parseable.

mod common;
mod prepare;
mod render;
mod set;
mod show;

pub use common::CommandContext;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Options derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Explicit settings file
    pub settings_path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "autodoc",
    about = "Fill per-country model documentation from warehouse metadata",
    version,
    long_about = "autodoc builds a per-country parameter cache from a run configuration and the \
                  data warehouse, renders one Word document per country from it, and uploads \
                  the results to cloud storage."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file (default: ~/.autodoc/config.toml)
    #[arg(long, global = true, env = "AUTODOC_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the parameter cache if it does not exist yet
    Prepare(prepare::PrepareCommand),
    /// Render one document per country and upload them
    Render(render::RenderCommand),
    /// Merge KEY=VALUE pairs into one country's record
    Set(set::SetCommand),
    /// Print the parameter cache
    Show(show::ShowCommand),
}

impl Cli {
    /// Initializes logging from the global flags and runs the subcommand.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            settings_path: self.settings.clone(),
        }
    }

    /// Runs the subcommand without touching the global logger.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let ctx = CommandContext::load(config.settings_path).await?;

        match self.command {
            Commands::Prepare(cmd) => cmd.execute(&ctx).await,
            Commands::Render(cmd) => cmd.execute(&ctx).await,
            Commands::Set(cmd) => cmd.execute(&ctx).await,
            Commands::Show(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
