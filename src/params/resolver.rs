//! Sentinel substitution for template values.
//!
//! This is plain substring replacement, not a template language: every
//! occurrence of [`SENTINEL_TOKEN`] inside a text value is replaced by the
//! country's table suffix. Text inside lists and maps is replaced too; other
//! values are copied unchanged.

use crate::constants::SENTINEL_TOKEN;
use crate::params::value::ParamMap;

/// Returns a copy of `fields` with the sentinel replaced by `suffix`.
///
/// `fields` is borrowed immutably: the same template is resolved once per
/// country and must come out of every call untouched.
///
/// ```rust
/// use autodoc_cli::params::{ParamMap, ParamValue, resolve};
///
/// let mut template = ParamMap::new();
/// template.insert("model_suffix".into(), ParamValue::from("model_RUN_SUFFIX"));
///
/// let resolved = resolve(&template, "fr01");
/// assert_eq!(resolved["model_suffix"], ParamValue::from("model_fr01"));
/// assert_eq!(template["model_suffix"], ParamValue::from("model_RUN_SUFFIX"));
/// ```
#[must_use]
pub fn resolve(fields: &ParamMap, suffix: &str) -> ParamMap {
    debug_assert!(!suffix.is_empty(), "table suffix must not be empty");

    fields
        .iter()
        .map(|(key, value)| (key.clone(), value.substitute(SENTINEL_TOKEN, suffix)))
        .collect()
}

/// Returns `true` if any text value, including text nested in lists and
/// maps, still contains the sentinel.
#[must_use]
pub fn contains_sentinel(fields: &ParamMap) -> bool {
    fields.values().any(|v| v.contains(SENTINEL_TOKEN))
}
