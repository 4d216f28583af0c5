// Monitor events and notifications
//
// MonitorEvent is what an interactive client shows as an in-app dialog or
// banner. Events are notifications streamed to clients, not stored.

use serde::{Deserialize, Serialize};

use crate::alert::AlertKind;

/// Local notification request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Platform sound id
    #[serde(default = "default_sound")]
    pub sound: String,
    /// Delay before delivery
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
}

fn default_sound() -> String {
    "default".to_string()
}

fn default_delay_seconds() -> u64 {
    1
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            sound: default_sound(),
            delay_seconds: default_delay_seconds(),
        }
    }
}

/// Permission state reported by a notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Event broadcast to interactive clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// An alert fired
    AlertRaised {
        kind: AlertKind,
        title: String,
        message: String,
    },
    /// The fall alarm started playing
    AlarmStarted,
    /// The fall alarm stopped
    AlarmStopped,
    /// Notifications cannot be delivered
    NotificationPermissionDenied,
}

impl MonitorEvent {
    /// Event name used for SSE `event:` lines
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::AlertRaised { .. } => "alert_raised",
            MonitorEvent::AlarmStarted => "alarm_started",
            MonitorEvent::AlarmStopped => "alarm_stopped",
            MonitorEvent::NotificationPermissionDenied => "notification_permission_denied",
        }
    }
}
