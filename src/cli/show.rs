//! `autodoc show`

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use super::common::CommandContext;
use crate::core::AutodocError;
use crate::params::ParameterRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Only show this country
    #[arg(long)]
    country: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ShowCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let cache = ctx.store().load()?;

        let records: Vec<&ParameterRecord> = match &self.country {
            Some(country) => vec![cache.get(country).ok_or_else(|| {
                AutodocError::UpdateTargetMissing {
                    country: country.clone(),
                }
            })?],
            None => cache.iter().collect(),
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            OutputFormat::Text => {
                for record in records {
                    println!("{}", record.country.cyan().bold());
                    for (key, value) in &record.data {
                        println!("  {key}: {value}");
                    }
                }
            }
        }
        Ok(())
    }
}
