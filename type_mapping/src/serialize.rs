//! Record serialization
//!
//! Converts any `Serialize` row into a column-keyed payload for lifecycle
//! event snapshots.

use crate::types::SqlValue;
use serde::Serialize;
use std::collections::HashMap;

/// Convert serializable data to `SqlValue::Record`
pub fn serialize_to_record<T: Serialize>(data: &T) -> SqlValue {
    SqlValue::Record(serialize_to_record_payload(data))
}

/// Serialize a row into a map of column name to typed value.
///
/// Non-object values (and serialization failures) produce an empty payload.
pub fn serialize_to_record_payload<T: Serialize>(data: &T) -> HashMap<String, SqlValue> {
    match serde_json::to_value(data) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| (key, SqlValue::from_json(value)))
            .collect(),
        _ => HashMap::new(),
    }
}
