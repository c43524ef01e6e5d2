//! Type mapping definitions
//!
//! This module provides the value type bound into queries and carried in
//! lifecycle event payloads.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Canonical textual form for timestamps (always UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Canonical textual form for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// PostgreSQL value used for bind parameters and event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Text(String),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Decimal(String), // Store as string to preserve precision
    Json(serde_json::Value),
    Array(Vec<SqlValue>),
    Record(HashMap<String, SqlValue>), // Full row snapshot for event payloads
    Null,
}

impl SqlValue {
    /// Whether this value is a list (only valid for `IN`)
    pub fn is_array(&self) -> bool {
        matches!(self, SqlValue::Array(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Text(_) => "text",
            SqlValue::SmallInt(_) => "smallint",
            SqlValue::Integer(_) => "integer",
            SqlValue::BigInt(_) => "bigint",
            SqlValue::Float(_) => "float",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Json(_) => "json",
            SqlValue::Array(_) => "array",
            SqlValue::Record(_) => "record",
            SqlValue::Null => "null",
        }
    }

    /// Explicit placeholder cast needed when the value is bound as text
    pub fn pg_cast(&self) -> Option<&'static str> {
        match self {
            SqlValue::Decimal(_) => Some("numeric"),
            _ => None,
        }
    }

    /// Canonical string form. Timestamps are rendered in UTC with
    /// microsecond precision so equal instants always produce equal strings.
    pub fn canonical_string(&self) -> String {
        match self {
            SqlValue::Text(s) | SqlValue::Decimal(s) => s.clone(),
            SqlValue::SmallInt(v) => v.to_string(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::BigInt(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Boolean(v) => v.to_string(),
            SqlValue::Uuid(v) => v.to_string(),
            SqlValue::Timestamp(v) => v.format(TIMESTAMP_FORMAT).to_string(),
            SqlValue::Date(v) => v.format(DATE_FORMAT).to_string(),
            SqlValue::Json(v) => v.to_string(),
            SqlValue::Array(items) => items
                .iter()
                .map(SqlValue::canonical_string)
                .collect::<Vec<_>>()
                .join(","),
            SqlValue::Record(map) => serde_json::to_string(map).unwrap_or_default(),
            SqlValue::Null => "NULL".to_string(),
        }
    }

    /// Plain JSON form, used when a list or record is bound as `jsonb`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Text(s) | SqlValue::Decimal(s) => serde_json::Value::String(s.clone()),
            SqlValue::SmallInt(v) => serde_json::Value::from(*v),
            SqlValue::Integer(v) => serde_json::Value::from(*v),
            SqlValue::BigInt(v) => serde_json::Value::from(*v),
            SqlValue::Float(v) => serde_json::Value::from(*v),
            SqlValue::Boolean(v) => serde_json::Value::Bool(*v),
            SqlValue::Uuid(_) | SqlValue::Timestamp(_) | SqlValue::Date(_) => {
                serde_json::Value::String(self.canonical_string())
            }
            SqlValue::Json(v) => v.clone(),
            SqlValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(SqlValue::to_json).collect())
            }
            SqlValue::Record(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            SqlValue::Null => serde_json::Value::Null,
        }
    }

    /// Convert a JSON value into the closest typed value.
    ///
    /// Strings holding RFC3339 timestamps or UUIDs become typed values,
    /// integers pick the narrowest of `Integer`/`BigInt`, arrays recurse and
    /// objects stay JSON.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    SqlValue::Timestamp(dt.with_timezone(&Utc))
                } else if let Ok(uuid) = Uuid::parse_str(&s) {
                    SqlValue::Uuid(uuid)
                } else {
                    SqlValue::Text(s)
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        SqlValue::Integer(i as i32)
                    } else {
                        SqlValue::BigInt(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    SqlValue::Float(f)
                } else {
                    SqlValue::Decimal(n.to_string())
                }
            }
            serde_json::Value::Bool(b) => SqlValue::Boolean(b),
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::Array(items) => {
                SqlValue::Array(items.into_iter().map(SqlValue::from_json).collect())
            }
            other => SqlValue::Json(other),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Text(val)
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(val: &String) -> Self {
        SqlValue::Text(val.clone())
    }
}

impl From<i16> for SqlValue {
    fn from(val: i16) -> Self {
        SqlValue::SmallInt(val)
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Integer(val)
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::BigInt(val)
    }
}

impl From<u32> for SqlValue {
    fn from(val: u32) -> Self {
        SqlValue::BigInt(val as i64)
    }
}

impl From<f32> for SqlValue {
    fn from(val: f32) -> Self {
        SqlValue::Float(val as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Float(val)
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Boolean(val)
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Uuid(val)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(val: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(val)
    }
}

// Offsets are normalized away so every bound instant is UTC.
impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(val: DateTime<FixedOffset>) -> Self {
        SqlValue::Timestamp(val.with_timezone(&Utc))
    }
}

// Naive timestamps are interpreted as UTC.
impl From<NaiveDateTime> for SqlValue {
    fn from(val: NaiveDateTime) -> Self {
        SqlValue::Timestamp(val.and_utc())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(val: NaiveDate) -> Self {
        SqlValue::Date(val)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(val: serde_json::Value) -> Self {
        SqlValue::from_json(val)
    }
}

impl<T> From<Vec<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(val: Vec<T>) -> Self {
        SqlValue::Array(val.into_iter().map(Into::into).collect())
    }
}
