//! Building a fresh parameter cache from a run configuration.
//!
//! For every run-list entry, in order, a record is assembled from:
//!
//! 1. a copy of `fulfill_template`
//! 2. values looked up once per build or per country: `name` (warehouse),
//!    `prepared_by` (identity) and `date_last_updated` (today, `DD/MM/YYYY`)
//! 3. any extra keys on the run-list entry
//! 4. the entry's own fields: `training_date`, `version`, `if_new`,
//!    `country`, `suffix_main` and `cutoff`
//!
//! and finally the sentinel is resolved over the whole merged map with the
//! entry's table suffix. Construction is all-or-nothing: the first failing
//! lookup aborts the build and no records are returned.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::collaborators::{Identity, ModelRow, Warehouse};
use crate::config::{RunConfig, RunEntry};
use crate::constants::{DATE_LAST_UPDATED_FORMAT, fields};
use crate::core::AutodocError;
use crate::params::resolver::resolve;
use crate::params::value::{ParamMap, ParamValue};
use crate::params::{Cache, ParameterRecord};

/// Builds caches using a warehouse and an identity collaborator.
pub struct CacheBuilder<'a, W, I> {
    warehouse: &'a W,
    identity: &'a I,
    today: NaiveDate,
}

impl<'a, W: Warehouse, I: Identity> CacheBuilder<'a, W, I> {
    /// Creates a builder stamping records with today's local date.
    pub fn new(warehouse: &'a W, identity: &'a I) -> Self {
        Self {
            warehouse,
            identity,
            today: Local::now().date_naive(),
        }
    }

    /// Overrides the date written to `date_last_updated`.
    #[must_use]
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Builds one record per run-list entry, in run-list order.
    ///
    /// # Errors
    ///
    /// - [`AutodocError::RunConfigInvalid`] if the configuration fails validation
    /// - [`AutodocError::IdentityUnavailable`] if the identity lookup yields an empty name
    /// - [`AutodocError::LookupEmpty`] if a table suffix has no model
    /// - any collaborator error, unchanged
    pub async fn build(&self, run_config: &RunConfig) -> Result<Cache> {
        run_config.validate()?;

        let principal = self.identity.current_principal().await?;
        let prepared_by = principal.trim();
        if prepared_by.is_empty() {
            return Err(AutodocError::IdentityUnavailable {
                reason: "the identity lookup returned an empty account name".to_string(),
            }
            .into());
        }

        let date_last_updated = self.today.format(DATE_LAST_UPDATED_FORMAT).to_string();
        info!(
            countries = run_config.run_list.len(),
            prepared_by, "Building parameter cache"
        );

        let mut records = Vec::with_capacity(run_config.run_list.len());
        for entry in &run_config.run_list {
            let rows = self.warehouse.distinct_models(&entry.table_suffix).await?;
            let model = select_model(&rows, &entry.table_suffix)?;

            let record = assemble_record(
                &run_config.fulfill_template,
                entry,
                model,
                prepared_by,
                &date_last_updated,
            );
            debug!(country = %record.country, model, "Parameter record built");
            records.push(record);
        }

        Ok(Cache::new(records))
    }
}

/// Picks the model name from a distinct-model query result.
///
/// Several rows are tolerated: a warning is logged and the first row wins.
///
/// # Errors
///
/// [`AutodocError::LookupEmpty`] when `rows` is empty.
pub fn select_model<'r>(rows: &'r [ModelRow], table_suffix: &str) -> Result<&'r str, AutodocError> {
    match rows {
        [] => Err(AutodocError::LookupEmpty {
            table_suffix: table_suffix.to_string(),
        }),
        [only] => Ok(&only.model),
        [first, ..] => {
            warn!(
                table_suffix,
                candidates = rows.len(),
                chosen = %first.model,
                "More than one model name found, choosing the first one"
            );
            Ok(&first.model)
        }
    }
}

/// Merges template, looked-up values and entry fields, then resolves the sentinel.
#[must_use]
pub fn assemble_record(
    template: &ParamMap,
    entry: &RunEntry,
    model: &str,
    prepared_by: &str,
    date_last_updated: &str,
) -> ParameterRecord {
    let mut data = template.clone();

    data.insert(fields::NAME.to_string(), ParamValue::from(model));
    data.insert(fields::PREPARED_BY.to_string(), ParamValue::Text(prepared_by.to_string()));
    data.insert(
        fields::DATE_LAST_UPDATED.to_string(),
        ParamValue::Text(date_last_updated.to_string()),
    );

    for (key, value) in &entry.extra {
        data.insert(key.clone(), value.clone());
    }

    data.insert(fields::TRAINING_DATE.to_string(), entry.training_date.clone());
    data.insert(fields::VERSION.to_string(), entry.version.clone());
    data.insert(fields::IF_NEW.to_string(), ParamValue::Bool(entry.if_new));
    data.insert(fields::COUNTRY.to_string(), ParamValue::Text(entry.country.clone()));
    data.insert(fields::SUFFIX_MAIN.to_string(), ParamValue::Text(entry.table_suffix.clone()));
    data.insert(fields::CUTOFF.to_string(), ParamValue::Float(entry.cutoff));

    ParameterRecord::new(entry.country.clone(), resolve(&data, &entry.table_suffix))
}
