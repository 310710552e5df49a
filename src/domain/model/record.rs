//! Untyped records at the storage boundary, plus the stamping and sanitizing
//! rules every write goes through.

use crate::domain::model::Table;
use crate::error::{DataError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value as JsonValue;

/// One row: a JSON object with at least `id`, `created_at`, `updated_at`.
pub type Record = serde_json::Map<String, JsonValue>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Filters `payload` down to the table's whitelist, dropping null values.
pub fn sanitize(table: Table, payload: &Record) -> Record {
    table
        .fields()
        .iter()
        .filter_map(|field| {
            payload
                .get(*field)
                .filter(|v| !v.is_null())
                .map(|v| (field.to_string(), v.clone()))
        })
        .collect()
}

/// Unwraps a JSON object into a record.
pub fn into_record(value: JsonValue) -> Result<Record> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(DataError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// The record's id as a string. Numeric ids are accepted and stringified.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get(ID_FIELD)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Millisecond timestamp plus a random alphanumeric suffix.
pub fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn is_valid_timestamp(value: &JsonValue) -> bool {
    value
        .as_str()
        .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
        .unwrap_or(false)
}

/// Prepares a payload for insertion: sanitizes it, then sets the three fields
/// the layer owns. A caller-supplied `id` / `created_at` survives if valid.
pub fn stamp_new(table: Table, payload: &Record) -> Record {
    let mut record = sanitize(table, payload);
    let now = now_timestamp();

    let id = record_id(&record).unwrap_or_else(generate_id);
    record.insert(ID_FIELD.to_string(), JsonValue::String(id));

    let keep_created = record
        .get(CREATED_AT_FIELD)
        .map(is_valid_timestamp)
        .unwrap_or(false);
    if !keep_created {
        record.insert(CREATED_AT_FIELD.to_string(), JsonValue::String(now.clone()));
    }
    record.insert(UPDATED_AT_FIELD.to_string(), JsonValue::String(now));
    record
}

/// Prepares an update patch: sanitized, identity fields removed, `updated_at` refreshed.
pub fn stamp_update(table: Table, payload: &Record) -> Record {
    let mut patch = sanitize(table, payload);
    patch.remove(ID_FIELD);
    patch.remove(CREATED_AT_FIELD);
    patch.insert(
        UPDATED_AT_FIELD.to_string(),
        JsonValue::String(now_timestamp()),
    );
    patch
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
