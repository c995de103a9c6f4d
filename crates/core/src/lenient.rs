//! Tolerant decoding of upstream payloads.
//!
//! The upstream API is not always consistent: bodies may be empty or not
//! JSON at all, lists arrive bare or wrapped, and numeric fields are
//! sometimes missing or `null`. None of that may surface as a parse error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::types::EntityId;

/// Keys under which a list may be wrapped, checked in order.
const LIST_KEYS: &[&str] = &["data", "items", "results"];

/// Parse a response body, falling back to an empty object for empty or
/// non-JSON input.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Extract the list from a bare array or a `{ "data": [...] }` style wrapper.
///
/// Anything else yields an empty list.
pub fn list_values(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Decode a whole record, logging and falling back to `T::default()` when
/// the payload does not have the expected shape at all.
///
/// Entity structs decode field by field, so this only fails for payloads
/// that are not objects.
pub fn decode<T: DeserializeOwned + Default>(value: Value) -> T {
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(
                error = %e,
                target_type = std::any::type_name::<T>(),
                "Discarding undecodable upstream payload",
            );
            T::default()
        }
    }
}

/// Decode each element of a JSON array, skipping (and logging) the ones
/// that do not decode.
fn elements<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable list element");
                None
            }
        })
        .collect()
}

/// Unwrap a single object from `{ "data": {...} }` if wrapped, otherwise
/// return the value unchanged.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Serde helper: a JSON array of records. `null` or any other value is an
/// empty list; elements that do not decode are skipped.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => elements(items),
        _ => Vec::new(),
    })
}

/// Serde helper: a nested record that is dropped (with a warning) instead
/// of failing its parent when malformed.
pub fn opt_record<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable nested record");
                Ok(None)
            }
        },
    }
}

/// Serde helper: `Some(s)` only for a JSON string.
pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Serde helper: a string where anything else counts as empty.
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Serde helper: `Some(b)` only for a JSON boolean.
pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// Serde helper: `Some(n)` only for a JSON number, `None` for anything else
/// (missing, `null`, strings, objects).
///
/// Use together with `#[serde(default)]`.
pub fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()))
}

/// Serde helper: like [`opt_number`] but rounded to whole minutes.
pub fn opt_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().filter(|n| n.is_finite()).map(|n| n.round() as i64)))
}

/// Serde helper: a number where `null` or garbage counts as zero.
pub fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(opt_number(deserializer)?.unwrap_or(0.0))
}

/// Serde helper: whole minutes where `null` or garbage counts as zero.
pub fn minutes_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(opt_minutes(deserializer)?.unwrap_or(0))
}

/// Serde helper: an id that may be missing, yielding an empty string.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EntityId, D::Error> {
    Ok(opt_id(deserializer)?.unwrap_or_default())
}

/// Serde helper: any scalar id (string or number) as a string.
pub fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<EntityId>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
