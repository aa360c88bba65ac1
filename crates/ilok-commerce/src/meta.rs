//! Metadata Values
//!
//! Order, line-item and product metadata on the host platform is loosely
//! typed: a key may hold a plain string, a number, or an ordered list of
//! strings, and different plugin revisions have written the same key in
//! different shapes. `MetaValue` models exactly those shapes so readers
//! normalize in one place instead of shape-checking at every call site.

use serde::{Deserialize, Serialize};

/// A single metadata value as stored by the order platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Plain string value
    Text(String),

    /// Integral value (timestamps, numeric account ids)
    Integer(i64),

    /// Ordered list of strings
    List(Vec<String>),
}

impl MetaValue {
    /// Build a text value
    pub fn text(value: impl Into<String>) -> Self {
        MetaValue::Text(value.into())
    }

    /// Build a list value
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetaValue::List(values.into_iter().map(Into::into).collect())
    }

    /// True for an empty string or an empty list; integers are never empty
    pub fn is_empty(&self) -> bool {
        match self {
            MetaValue::Text(s) => s.is_empty(),
            MetaValue::Integer(_) => false,
            MetaValue::List(l) => l.is_empty(),
        }
    }

    /// The string value, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value, if this is an integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerce to a string: text as-is, integers stringified, lists rejected
    pub fn coerce_text(&self) -> Option<String> {
        match self {
            MetaValue::Text(s) => Some(s.clone()),
            MetaValue::Integer(n) => Some(n.to_string()),
            MetaValue::List(_) => None,
        }
    }

    /// Normalize a stored deposit-reference value into a sequence.
    ///
    /// A plain string yields a one-element sequence, a list yields itself,
    /// and anything else (including a blank string) yields an empty
    /// sequence. Readers must accept both shapes because a single deposited
    /// license is stored as a scalar and multiples as a list.
    pub fn to_reference_list(&self) -> Vec<String> {
        match self {
            MetaValue::Text(s) if !s.trim().is_empty() => vec![s.clone()],
            MetaValue::List(l) => l.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        MetaValue::List(value)
    }
}
