//! Tagged values stored in a record's `data` map.

use chrono::NaiveDate;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flat field-name → value mapping used for templates, records and patches.
pub type ParamMap = BTreeMap<String, ParamValue>;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single parameter value.
///
/// Serialized without a tag, so JSON/YAML values map onto the variants
/// directly. A string becomes [`ParamValue::Date`] only when it is exactly the
/// canonical `YYYY-MM-DD` form of that date; `2024-1-5` or ` 2024-01-05` stay
/// text. Writing a date yields the same string back, so a cache survives a
/// read/write cycle byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
    List(Vec<ParamValue>),
    Map(ParamMap),
}

/// Parses `s` as a date only if formatting the date gives `s` back.
fn canonical_date(s: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s, ISO_DATE_FORMAT).ok()?;
    (date.format(ISO_DATE_FORMAT).to_string() == s).then_some(date)
}

impl ParamValue {
    /// Returns the string content of a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if this value, or any text nested in it, contains `token`.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        match self {
            Self::Text(s) => s.contains(token),
            Self::List(items) => items.iter().any(|v| v.contains(token)),
            Self::Map(map) => map.values().any(|v| v.contains(token)),
            _ => false,
        }
    }

    /// Replaces every occurrence of `token` in text with `replacement`.
    ///
    /// Lists and maps are walked recursively (map keys are left alone); other
    /// values are returned unchanged.
    #[must_use]
    pub fn substitute(&self, token: &str, replacement: &str) -> Self {
        match self {
            Self::Text(s) if s.contains(token) => Self::from(s.replace(token, replacement)),
            Self::List(items) => {
                Self::List(items.iter().map(|v| v.substitute(token, replacement)).collect())
            }
            Self::Map(map) => Self::Map(
                map.iter().map(|(k, v)| (k.clone(), v.substitute(token, replacement))).collect(),
            ),
            other => other.clone(),
        }
    }

    /// Parses a command-line value as YAML.
    ///
    /// `0.9` becomes a float, `true` a boolean, `2024-01-01` a date and
    /// `[a, b]` a list; anything that is not valid YAML is text. Empty input
    /// is text, not null.
    #[must_use]
    pub fn parse_scalar(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Text(String::new());
        }
        match serde_yaml::from_str::<Self>(raw) {
            Ok(value) => value,
            Err(_) => Self::from(raw),
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParamValueVisitor;

        impl<'de> Visitor<'de> for ParamValueVisitor {
            type Value = ParamValue;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a parameter value")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                ParamValue::deserialize(deserializer)
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Beyond i64 only a float can hold it
                Ok(i64::try_from(value).map_or(ParamValue::Float(value as f64), ParamValue::Integer))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::from(value))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ParamValue::from(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(ParamValue::List(items))
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = ParamMap::new();
                while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
                    map.insert(key, value);
                }
                Ok(ParamValue::Map(map))
            }
        }

        deserializer.deserialize_any(ParamValueVisitor)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Date(d) => write!(f, "{}", d.format(ISO_DATE_FORMAT)),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(_) | Self::Map(_) => {
                write!(f, "{}", serde_json::to_string(self).map_err(|_| fmt::Error)?)
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        match canonical_date(s) {
            Some(date) => Self::Date(date),
            None => Self::Text(s.to_string()),
        }
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        match canonical_date(&s) {
            Some(date) => Self::Date(date),
            None => Self::Text(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}
