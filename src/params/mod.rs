//! Per-country parameter records and the cache that persists them.
//!
//! The parameter cache (`fulfill_params.json` by default) is a JSON array with
//! one object per country:
//!
//! ```json
//! [
//!   {
//!     "country": "FR",
//!     "data": {
//!       "country": "FR",
//!       "cutoff": 0.5,
//!       "date_last_updated": "16/10/2026",
//!       "if_new": true,
//!       "model_suffix": "model_fr01",
//!       "name": "churn_model",
//!       "prepared_by": "analyst@example.com",
//!       "suffix_main": "fr01",
//!       "training_date": "2024-01-01",
//!       "version": "v1"
//!     }
//!   }
//! ]
//! ```
//!
//! # Modules
//!
//! - [`value`] - The tagged [`ParamValue`] union
//! - [`resolver`] - Sentinel substitution in template values
//! - [`io`] - Reading and atomically writing the cache file
//! - [`lock`] - Advisory lock serializing read-modify-write cycles
//! - [`builder`] - Building a fresh cache from a run configuration
//! - [`store`] - Load-or-create and merge-update entry points

pub mod builder;
pub mod io;
pub mod lock;
pub mod resolver;
pub mod store;
pub mod value;

pub use builder::{CacheBuilder, select_model};
pub use io::{CacheRead, read_cache, write_cache};
pub use lock::CacheLock;
pub use resolver::resolve;
pub use store::ParamStore;
pub use value::{ParamMap, ParamValue};

use serde::{Deserialize, Serialize};

/// Parameters used to render one country's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Unique key within a cache
    pub country: String,
    /// Resolved fields handed to the renderer
    pub data: ParamMap,
}

impl ParameterRecord {
    /// Creates a record from a country name and its data.
    #[must_use]
    pub fn new(country: impl Into<String>, data: ParamMap) -> Self {
        Self {
            country: country.into(),
            data,
        }
    }

    /// Shallow-merges `patch` into `data`; patch keys overwrite existing ones.
    pub fn merge(&mut self, patch: &ParamMap) {
        for (key, value) in patch {
            self.data.insert(key.clone(), value.clone());
        }
    }
}

/// Result of a merge-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum UpdateOutcome {
    /// The record was merged and the cache persisted
    Updated,
    /// No record has the requested country; nothing changed
    NotFound,
}

/// Ordered sequence of parameter records, in run-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    records: Vec<ParameterRecord>,
}

impl Cache {
    /// Wraps records in their given order.
    #[must_use]
    pub fn new(records: Vec<ParameterRecord>) -> Self {
        Self {
            records,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[ParameterRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ParameterRecord> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterRecord> {
        self.records.iter()
    }

    /// Countries in cache order.
    #[must_use]
    pub fn countries(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.country.as_str()).collect()
    }

    /// Finds the record whose country equals `country` exactly.
    #[must_use]
    pub fn get(&self, country: &str) -> Option<&ParameterRecord> {
        self.records.iter().find(|r| r.country == country)
    }

    /// Merges `patch` into every record whose country equals `country`.
    ///
    /// Does not touch the cache when nothing matches.
    pub fn apply_patch(&mut self, country: &str, patch: &ParamMap) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::NotFound;
        for record in self.records.iter_mut().filter(|r| r.country == country) {
            record.merge(patch);
            outcome = UpdateOutcome::Updated;
        }
        outcome
    }

    /// Returns the first country that appears more than once, if any.
    #[must_use]
    pub fn duplicate_country(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records.iter().map(|r| r.country.as_str()).find(|country| !seen.insert(*country))
    }
}

impl<'a> IntoIterator for &'a Cache {
    type Item = &'a ParameterRecord;
    type IntoIter = std::slice::Iter<'a, ParameterRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
