// Alert log records
//
// Records live under `alerts/` keyed by a store-assigned id. The stored body
// is `{ "type": "Fall", "message": "...", "timestamp": "<RFC 3339>" }`; the id
// is the key, not part of the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Kind of alert written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AlertKind {
    #[serde(alias = "temperature")]
    Temperature,
    #[serde(alias = "fall")]
    Fall,
    #[serde(alias = "mood")]
    Mood,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] = [AlertKind::Temperature, AlertKind::Fall, AlertKind::Mood];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Temperature => "Temperature",
            AlertKind::Fall => "Fall",
            AlertKind::Mood => "Mood",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a new alert, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl NewAlert {
    /// Create a new alert stamped with the current time
    pub fn now(kind: AlertKind, message: impl Into<String>) -> Self {
        Self::at(kind, message, Utc::now())
    }

    pub fn at(kind: AlertKind, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp,
        }
    }
}

/// An alert as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertRecord {
    /// Store-assigned id
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    pub fn from_new(id: impl Into<String>, alert: NewAlert) -> Self {
        Self {
            id: id.into(),
            kind: alert.kind,
            message: alert.message,
            timestamp: alert.timestamp,
        }
    }
}

/// Filter dimension of the alert log view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    Kind(AlertKind),
}

impl AlertFilter {
    pub fn matches(&self, record: &AlertRecord) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Kind(kind) => record.kind == *kind,
        }
    }
}

impl FromStr for AlertFilter {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(AlertFilter::All),
            "temperature" => Ok(AlertFilter::Kind(AlertKind::Temperature)),
            "fall" => Ok(AlertFilter::Kind(AlertKind::Fall)),
            "mood" => Ok(AlertFilter::Kind(AlertKind::Mood)),
            other => Err(MonitorError::InvalidFilter(other.to_string())),
        }
    }
}

impl fmt::Display for AlertFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertFilter::All => f.write_str("all"),
            AlertFilter::Kind(kind) => f.write_str(&kind.as_str().to_ascii_lowercase()),
        }
    }
}
