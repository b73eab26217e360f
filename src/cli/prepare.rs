//! `autodoc prepare`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::CommandContext;
use crate::constants::fields;
use crate::params::ParameterRecord;

#[derive(Args, Debug)]
pub struct PrepareCommand {
    /// Run configuration (default: `run_config` from the settings)
    #[arg(long, value_name = "PATH")]
    run_config: Option<PathBuf>,
}

impl PrepareCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let (store, cache) = ctx.load_or_create_cache(self.run_config.as_deref()).await?;

        println!("{} {}", "Parameter cache:".bold(), store.path().display());
        for record in &cache {
            println!("  {}", summary_line(record));
        }
        Ok(())
    }
}

/// `FR  churn_model  v1  (fr01)`, omitting what the record lacks.
pub(crate) fn summary_line(record: &ParameterRecord) -> String {
    let mut parts = vec![record.country.clone()];
    for key in [fields::NAME, fields::VERSION] {
        if let Some(value) = record.data.get(key) {
            parts.push(value.to_string());
        }
    }
    if let Some(suffix) = record.data.get(fields::SUFFIX_MAIN) {
        parts.push(format!("({suffix})"));
    }
    parts.join("  ")
}
