//! Memory record and metadata normalization.
//!
//! Metadata is a free-form JSON object with two fields the system relies on:
//! `tags` (always a list of strings once normalized) and `timestamp` (RFC 3339,
//! injected at creation when absent).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

pub type Metadata = serde_json::Map<String, Value>;

/// A record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

impl MemoryRecord {
    /// Stored tags, or empty when the stored metadata has none.
    pub fn tags(&self) -> Vec<String> {
        match self.metadata.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Normalize a caller-supplied `tags` value into a clean list.
///
/// Accepts a list of strings or one comma-separated string. Entries are trimmed
/// and blanks dropped.
pub fn normalize_tags(value: Option<&Value>) -> Result<Vec<String>, String> {
    let raw: Vec<&str> = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) => s.split(',').collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| format!("tags must be strings, got {item}"))
            })
            .collect::<Result<_, _>>()?,
        Some(other) => return Err(format!("tags must be a list of strings, got {other}")),
    };

    Ok(raw
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

/// Prepare metadata for a new record: normalized `tags`, and a `timestamp` when absent.
pub fn prepare_metadata(metadata: Option<Metadata>, now: DateTime<Utc>) -> Result<Metadata, String> {
    let mut metadata = metadata.unwrap_or_default();

    let tags = normalize_tags(metadata.get("tags"))?;
    metadata.insert(
        "tags".into(),
        Value::Array(tags.into_iter().map(Value::String).collect()),
    );

    let has_timestamp = !matches!(metadata.get("timestamp"), None | Some(Value::Null));
    if !has_timestamp {
        metadata.insert("timestamp".into(), Value::String(format_timestamp(now)));
    }

    Ok(metadata)
}

/// Unix seconds for the record's `timestamp`, if it is RFC 3339 text or a number.
pub fn timestamp_seconds(metadata: &Metadata) -> Option<f64> {
    match metadata.get("timestamp")? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_micros() as f64 / 1_000_000.0),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
