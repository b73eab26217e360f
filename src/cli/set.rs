//! `autodoc set`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;
use crate::core::AutodocError;
use crate::params::{ParamMap, ParamValue, UpdateOutcome};

#[derive(Args, Debug)]
pub struct SetCommand {
    /// Country whose record is updated (exact match)
    country: String,

    /// Fields to merge, as KEY=VALUE. Values are read as YAML:
    /// `0.9` is a number, `true` a boolean, `2024-01-01` a date, `[a, b]` a list.
    #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_assignment)]
    assignments: Vec<(String, ParamValue)>,
}

/// Splits `KEY=VALUE` at the first `=`.
fn parse_assignment(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((key.to_string(), ParamValue::parse_scalar(value)))
}

impl SetCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let patch: ParamMap = self.assignments.into_iter().collect();

        match ctx.store().update_on_disk(&self.country, &patch).await? {
            UpdateOutcome::Updated => {
                println!(
                    "{} {} field(s) on {}",
                    "Updated".green(),
                    patch.len(),
                    self.country.bold()
                );
                Ok(())
            }
            UpdateOutcome::NotFound => Err(AutodocError::UpdateTargetMissing {
                country: self.country,
            }
            .into()),
        }
    }
}
