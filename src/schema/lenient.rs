//! Lenient field decoding for hand-entered log entries
//!
//! Every helper here accepts any JSON value and recovers a default instead of
//! failing: numbers may arrive as strings, flags as 0/1, lists as `null`.
//! Used through `#[serde(deserialize_with = "...")]` on [`RawLogEntry`].
//!
//! [`RawLogEntry`]: super::RawLogEntry

use crate::normalizer;
use crate::schema::Recitation;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Interpret a JSON value as a finite number
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

pub(crate) fn count_from(value: &Value) -> u64 {
    number(value)
        .map(normalizer::non_negative)
        .map(|v| v.floor() as u64)
        .unwrap_or(0)
}

pub(crate) fn flag_from(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "on" | "1"
        ),
        _ => false,
    }
}

/// Non-negative decimal, 0 when missing or malformed
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).map(normalizer::non_negative).unwrap_or(0.0))
}

/// Non-negative integer count, fractional parts truncated
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from(&value))
}

/// Like [`count`], saturating at `u32::MAX`
pub fn small_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(u32::try_from(count_from(&value)).unwrap_or(u32::MAX))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag_from(&value))
}

/// String field; numbers are rendered, anything else becomes empty
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Optional string field; blank strings become `None`
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Outcome rating coerced into 1..=5, `None` when absent or non-numeric
pub fn rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).and_then(normalizer::clean_rating))
}

/// Recitation list; non-object items are dropped
pub fn recitations<'de, D>(deserializer: D) -> Result<Vec<Recitation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<Recitation>(item).ok())
        .collect())
}

/// App name → minutes; malformed minute values count as 0
pub fn app_minutes<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(apps) = value else {
        return Ok(BTreeMap::new());
    };

    Ok(apps
        .into_iter()
        .filter(|(app, _)| !app.trim().is_empty())
        .map(|(app, minutes)| {
            let minutes = number(&minutes).map(normalizer::non_negative).unwrap_or(0.0);
            (app, minutes)
        })
        .collect())
}
