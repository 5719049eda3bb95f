//! # Parameter Values
//!
//! Dynamic values bound to route keys, metadata constraints and URL options.
//!
//! Path captures are always strings, but callers generating URLs pass ids,
//! flags, lists of trailing segments or explicit nulls, so values stay a small
//! sum type and comparisons go through [`ParamValue::loose_eq`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered parameter map.
///
/// Ordered so that matching, generation and export are deterministic.
pub type Params = BTreeMap<String, ParamValue>;

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Explicit absence; removes a segment when generating
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    String(String),
    /// List of strings (wildcard segments, allowed metadata values)
    List(Vec<String>),
}

impl ParamValue {
    /// Render the value the way it is written into a path.
    ///
    /// Lists join with `/`, `Null` renders empty.
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::List(items) => items.join("/"),
        }
    }

    /// Check if value is `Null`
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as &str if String variant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compare by rendered form, so `Int(5)` equals `String("5")`.
    ///
    /// `Null` only equals `Null`.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (a, b) => a == b || a.as_string() == b.as_string(),
        }
    }

    /// Whether a metadata value satisfies this declared constraint.
    ///
    /// A list admits any of its members; anything else admits a value with
    /// the same rendered form. A missing value is only admitted by `Null`.
    #[must_use]
    pub fn admits(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Null, None) => true,
            (_, None) => false,
            (Self::List(allowed), Some(v)) => allowed.iter().any(|a| a == v),
            (declared, Some(v)) => declared.as_string() == v,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build a [`Params`] map from `(name, value)` pairs
pub fn params_from<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
