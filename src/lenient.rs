//! Forgiving field readers for persisted documents.
//!
//! Optional fields that are null or of an unexpected type fall back to their
//! default instead of failing the whole document. Scalars are accepted where a
//! string is expected.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::models::Pair;

/// String form of a JSON value; `None` only for null
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integers, or strings made only of digits
pub(crate) fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn read_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(value_to_string)
}

pub(crate) fn read_bool(map: &Map<String, Value>, key: &str, default: bool) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        _ => default,
    }
}

pub(crate) fn required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(&value).ok_or_else(|| D::Error::custom("expected a string, found null"))
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).unwrap_or_default())
}

pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

pub(crate) fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&value).unwrap_or(0))
}

pub(crate) fn timeout<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&value).unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
}

/// `[{"key": .., "value": ..}]`; items without a usable key are skipped
pub(crate) fn pairs<'de, D>(deserializer: D) -> Result<Vec<Pair>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let key = read_str(item, "key").filter(|k| !k.is_empty())?;
            Some(Pair::new(key, read_str(item, "value").unwrap_or_default()))
        })
        .collect())
}

/// Variable map; scalar values are stored as their string form
pub(crate) fn variables<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    Ok(map
        .iter()
        .map(|(key, value)| (key.clone(), value_to_string(value).unwrap_or_default()))
        .collect())
}

/// Anything but an array reads as empty; items must still parse
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
        .collect()
}
