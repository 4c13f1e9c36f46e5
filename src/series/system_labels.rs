//! Flattening of the raw system-label payload attached to each sample.
//!
//! The payload is an untyped JSON blob. Only an object root is accepted; every member
//! becomes one string pair, in document order.

use serde_json::Value;

use crate::{SeriesError, SeriesResult};

/// Parses `raw` into `(key, value)` pairs.
///
/// The whole payload is decoded before anything is returned, so a rejected payload
/// never yields a partial result.
///
/// # Errors
/// Returns [`SeriesError::InvalidSystemLabels`] for empty input or a root that is not
/// an object, and [`SeriesError::Json`] for text that is not valid JSON.
pub fn parse_system_labels(raw: &[u8]) -> SeriesResult<Vec<(String, String)>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(SeriesError::InvalidSystemLabels("empty payload"));
    }

    match serde_json::from_slice::<Value>(raw)? {
        Value::Object(members) => Ok(members
            .into_iter()
            .map(|(key, value)| (key, flatten_value(value)))
            .collect()),
        Value::Null => Err(SeriesError::InvalidSystemLabels("null payload")),
        Value::Array(_) => Err(SeriesError::InvalidSystemLabels("array payload")),
        _ => Err(SeriesError::InvalidSystemLabels("scalar payload")),
    }
}

fn flatten_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        // numbers, booleans and nested structures keep their compact JSON text
        other => other.to_string(),
    }
}
