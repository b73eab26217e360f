//! The human-edited run configuration.
//!
//! ```yaml
//! fulfill_template:
//!   model_suffix: model_RUN_SUFFIX
//!   scores_table: analytics.scores_RUN_SUFFIX
//!   owner: Risk Analytics
//! run_list:
//!   - country: FR
//!     table_suffix: fr01
//!     training_date: 2024-01-01
//!     version: v1
//!     if_new: true
//!     cutoff: 0.5
//! ```
//!
//! JSON is accepted as well since it is valid YAML.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use crate::core::AutodocError;
use crate::params::value::{ParamMap, ParamValue};

/// Template plus ordered per-country overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Fields shared by every country; text values may contain the sentinel
    #[serde(default)]
    pub fulfill_template: ParamMap,
    /// Per-country entries; their order is the cache order
    pub run_list: Vec<RunEntry>,
}

/// One country's overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub country: String,
    /// Replaces the sentinel and names the warehouse table
    pub table_suffix: String,
    pub training_date: ParamValue,
    pub version: ParamValue,
    pub if_new: bool,
    pub cutoff: f64,
    /// Any other keys, merged into the record before the fields above
    #[serde(flatten)]
    pub extra: ParamMap,
}

fn table_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid table suffix pattern"))
}

/// Returns `true` if `suffix` can be interpolated into a table name.
#[must_use]
pub fn is_valid_table_suffix(suffix: &str) -> bool {
    table_suffix_pattern().is_match(suffix)
}

impl RunConfig {
    /// Parses a run configuration from YAML (or JSON) text.
    ///
    /// # Errors
    ///
    /// [`AutodocError::RunConfigParseError`] on syntax or shape errors,
    /// [`AutodocError::RunConfigInvalid`] if validation fails.
    pub fn from_yaml_str(content: &str, file: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| AutodocError::RunConfigParseError {
                file: file.to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a run configuration file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read run configuration: {}", path.display()))?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Checks the invariants the cache builder relies on.
    ///
    /// - `run_list` is not empty
    /// - every `country` is non-empty and unique
    /// - every `table_suffix` matches `[A-Za-z0-9_]+`
    pub fn validate(&self) -> Result<(), AutodocError> {
        if self.run_list.is_empty() {
            return Err(AutodocError::RunConfigInvalid {
                reason: "run_list is empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.run_list.iter().enumerate() {
            if entry.country.trim().is_empty() {
                return Err(AutodocError::RunConfigInvalid {
                    reason: format!("run_list[{index}] has an empty country"),
                });
            }
            if !seen.insert(entry.country.as_str()) {
                return Err(AutodocError::RunConfigInvalid {
                    reason: format!("country '{}' appears more than once in run_list", entry.country),
                });
            }
            if !is_valid_table_suffix(&entry.table_suffix) {
                return Err(AutodocError::InvalidTableSuffix {
                    suffix: entry.table_suffix.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
fulfill_template:
  model_suffix: model_RUN_SUFFIX
  owner: Risk Analytics
run_list:
  - country: FR
    table_suffix: fr01
    training_date: 2024-01-01
    version: v1
    if_new: true
    cutoff: 0.5
  - country: IT
    table_suffix: it02
    training_date: "2023-12-15"
    version: 3
    if_new: false
    cutoff: 1
    sponsor: Milan office
"#;

    #[test]
    fn test_parse_sample() {
        let config = RunConfig::from_yaml_str(SAMPLE, "run_config.yaml").unwrap();

        assert_eq!(config.fulfill_template["model_suffix"], ParamValue::from("model_RUN_SUFFIX"));
        assert_eq!(config.run_list.len(), 2);

        let fr = &config.run_list[0];
        assert_eq!(fr.country, "FR");
        assert_eq!(fr.training_date, ParamValue::from("2024-01-01"));
        assert!(fr.if_new);
        assert_eq!(fr.cutoff, 0.5);
        assert!(fr.extra.is_empty());

        let it = &config.run_list[1];
        assert_eq!(it.version, ParamValue::Integer(3));
        assert_eq!(it.cutoff, 1.0);
        assert_eq!(it.extra["sponsor"], ParamValue::from("Milan office"));
    }

    #[test]
    fn test_template_accepts_lists_and_maps() {
        let yaml = r#"
fulfill_template:
  features: [age, income]
  thresholds:
    low: 0.2
    table: scores_RUN_SUFFIX
run_list:
  - country: FR
    table_suffix: fr01
    training_date: 2024-01-01
    version: v1
    if_new: true
    cutoff: 0.5
    reviewers: [ana, luc]
"#;
        let config = RunConfig::from_yaml_str(yaml, "run_config.yaml").unwrap();

        assert_eq!(
            config.fulfill_template["features"],
            ParamValue::List(vec![ParamValue::from("age"), ParamValue::from("income")])
        );
        assert!(matches!(config.fulfill_template["thresholds"], ParamValue::Map(_)));
        assert!(matches!(config.run_list[0].extra["reviewers"], ParamValue::List(_)));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"fulfill_template": {"a": "RUN_SUFFIX"}, "run_list": [
            {"country": "FR", "table_suffix": "fr01", "training_date": "2024-01-01",
             "version": "v1", "if_new": true, "cutoff": 0.5}]}"#;
        let config = RunConfig::from_yaml_str(json, "run_config.json").unwrap();
        assert_eq!(config.run_list[0].table_suffix, "fr01");
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = "run_list:\n  - country: FR\n    table_suffix: fr01\n";
        let err = RunConfig::from_yaml_str(yaml, "run_config.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutodocError>(),
            Some(AutodocError::RunConfigParseError { .. })
        ));
    }

    #[test]
    fn test_empty_run_list_is_invalid() {
        let err = RunConfig::from_yaml_str("run_list: []\n", "run_config.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutodocError>(),
            Some(AutodocError::RunConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_duplicate_country_is_invalid() {
        let yaml = SAMPLE.replace("country: IT", "country: FR");
        let err = RunConfig::from_yaml_str(&yaml, "run_config.yaml").unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_table_suffix_validation() {
        assert!(is_valid_table_suffix("fr01"));
        assert!(is_valid_table_suffix("FR_01"));
        assert!(!is_valid_table_suffix(""));
        assert!(!is_valid_table_suffix("fr01`; DROP TABLE x"));
        assert!(!is_valid_table_suffix("fr-01"));

        let yaml = SAMPLE.replace("table_suffix: fr01", "table_suffix: fr.01");
        let err = RunConfig::from_yaml_str(&yaml, "run_config.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutodocError>(),
            Some(AutodocError::InvalidTableSuffix { .. })
        ));
    }
}
