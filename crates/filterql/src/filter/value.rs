//! Replacement values and their canonical serialization for parameter binding.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Named replacement values for `{:name}` placeholders.
pub type Replacements = HashMap<String, Value>;

/// Layout of every timestamp bound as a parameter, macro or caller supplied.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f +0000 UTC";

/// Formats a timestamp in the canonical bound-parameter layout.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use filterql_rs::filter::format_timestamp;
///
/// let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_timestamp(&date), "2023-01-01 00:00:00 +0000 UTC");
/// ```
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A value supplied by the caller for a named placeholder, or produced by a macro.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL; compares like the empty string under `=` / `!=`.
    Null,
    /// Boolean; always rendered inline as `1` / `0`.
    Bool(bool),
    /// Integer number.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// Text.
    Text(String),
    /// Point in time, bound in [`TIMESTAMP_FORMAT`].
    Timestamp(DateTime<Utc>),
    /// Ordered list, bound as JSON text.
    Array(Vec<Value>),
    /// Ordered key/value pairs, bound as JSON text in insertion order.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Builds an object value from key/value pairs, keeping their order.
    pub fn object<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Serializes the value to the scalar that gets bound as a parameter.
    ///
    /// Null binds as empty text and booleans as `1` / `0`; the compiler
    /// renders both inline before ever reaching this point.
    pub fn to_bound(&self) -> BoundValue {
        match self {
            Value::Null => BoundValue::Text(String::new()),
            Value::Bool(b) => BoundValue::Integer(i64::from(*b)),
            Value::Integer(i) => BoundValue::Integer(*i),
            Value::Real(f) => BoundValue::Real(*f),
            Value::Text(s) => BoundValue::Text(s.clone()),
            Value::Timestamp(ts) => BoundValue::Text(format_timestamp(ts)),
            Value::Array(_) | Value::Object(_) => BoundValue::Text(self.to_json().to_string()),
        }
    }

    /// Converts the value to JSON; timestamps become canonical strings and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// A scalar parameter value handed to the query executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    /// Integer parameter.
    Integer(i64),
    /// Floating point parameter.
    Real(f64),
    /// Text parameter (also used for timestamps and JSON text).
    Text(String),
}

impl BoundValue {
    /// Returns the value as text, as it would appear inside a LIKE pattern.
    pub fn to_text(&self) -> String {
        match self {
            BoundValue::Integer(i) => i.to_string(),
            BoundValue::Real(f) => f.to_string(),
            BoundValue::Text(s) => s.clone(),
        }
    }

    /// Renders the value as an SQL literal, for display only.
    pub fn to_sql_literal(&self) -> String {
        match self {
            BoundValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_text(),
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
