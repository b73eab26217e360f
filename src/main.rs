//! autodoc command-line entry point.
//!
//! Errors are reported with [`user_friendly_error`] and exit code 1.

use anyhow::Result;
use autodoc_cli::cli;
use autodoc_cli::core::error::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
