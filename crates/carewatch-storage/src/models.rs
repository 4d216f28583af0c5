// Wire models for the Firebase Realtime Database REST API

use carewatch_core::{AlertRecord, NewAlert, Reading};
use serde::Deserialize;
use serde_json::Value;

/// Response body of `POST {path}.json`
#[derive(Debug, Deserialize)]
pub struct PushResponse {
    /// Generated child key
    pub name: String,
}

/// Data field of a `put` / `patch` streaming event
#[derive(Debug, Deserialize)]
pub struct StreamPayload {
    pub path: String,
    #[serde(default)]
    pub data: Value,
}

/// Convert a `house/` snapshot into a reading
///
/// Returns `None` for an empty path or a record the hub has not finished
/// writing (missing `temp` or `humidity`).
pub fn reading_from_value(value: &Value) -> Option<Reading> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value::<Reading>(value.clone()) {
        Ok(reading) => Some(reading),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed house record");
            None
        }
    }
}

/// Convert an `alerts/` snapshot (map of id -> body) into records
pub fn alerts_from_value(value: &Value) -> Vec<AlertRecord> {
    let Value::Object(entries) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(
            |(id, body)| match serde_json::from_value::<NewAlert>(body.clone()) {
                Ok(alert) => Some(AlertRecord::from_new(id.clone(), alert)),
                Err(e) => {
                    tracing::warn!(alert_id = %id, error = %e, "Skipping malformed alert record");
                    None
                }
            },
        )
        .collect()
}
