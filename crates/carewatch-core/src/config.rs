// Monitor configuration
//
// MonitorConfig is a store-agnostic configuration struct that can be:
// - Created directly for tests and embedded usage
// - Built from environment variables by the worker and API binaries

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MonitorError;
use crate::reading::Mood;

/// Re-fire policy for one alert kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Fire once per inactive -> active transition
    Edge,
    /// Fire on entry and at most once per cooldown window while active;
    /// entries inside the window are dropped without recording the transition
    EdgeWithCooldown,
    /// Fire on every qualifying sample
    Level,
}

impl FromStr for AlertPolicy {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" | "edge_with_cooldown" => Ok(AlertPolicy::EdgeWithCooldown),
            "edge_only" | "strict_edge" => Ok(AlertPolicy::Edge),
            "level" => Ok(AlertPolicy::Level),
            other => Err(MonitorError::config(format!(
                "unknown alert policy '{}', expected edge, strict_edge or level",
                other
            ))),
        }
    }
}

/// Threshold values used by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Temperatures strictly below this value are anomalous
    #[serde(default = "default_low_c")]
    pub temperature_low_c: f64,

    /// Temperatures strictly above this value are anomalous
    #[serde(default = "default_high_c")]
    pub temperature_high_c: f64,

    /// Moods that count as emotional distress
    #[serde(default = "default_distress_moods")]
    pub distress_moods: Vec<Mood>,
}

fn default_low_c() -> f64 {
    5.0
}

fn default_high_c() -> f64 {
    40.0
}

fn default_distress_moods() -> Vec<Mood> {
    vec![Mood::Sad, Mood::Fear]
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_low_c: default_low_c(),
            temperature_high_c: default_high_c(),
            distress_moods: default_distress_moods(),
        }
    }
}

/// Configuration for the alert controller and presenters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Re-fire policy for temperature alerts
    #[serde(default = "default_temperature_policy")]
    pub temperature_policy: AlertPolicy,

    /// Minimum time between two firings of a cooldown-governed kind
    #[serde(default = "default_alert_cooldown_ms")]
    pub alert_cooldown_ms: i64,

    /// Offset applied when grouping alerts by calendar day
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Asset loaded for the fall alarm
    #[serde(default = "default_alarm_sound_asset")]
    pub alarm_sound_asset: String,
}

fn default_temperature_policy() -> AlertPolicy {
    AlertPolicy::EdgeWithCooldown
}

fn default_alert_cooldown_ms() -> i64 {
    30_000
}

fn default_alarm_sound_asset() -> String {
    "alarm.mp3".to_string()
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temperature re-fire policy
    pub fn with_temperature_policy(mut self, policy: AlertPolicy) -> Self {
        self.temperature_policy = policy;
        self
    }

    /// Set the alert cooldown
    pub fn with_alert_cooldown_ms(mut self, cooldown_ms: i64) -> Self {
        self.alert_cooldown_ms = cooldown_ms;
        self
    }

    /// Set thresholds
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the day-grouping offset
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            temperature_policy: default_temperature_policy(),
            alert_cooldown_ms: default_alert_cooldown_ms(),
            utc_offset_minutes: 0,
            alarm_sound_asset: default_alarm_sound_asset(),
        }
    }
}

/// Builder for MonitorConfig with fluent API
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
        }
    }

    pub fn temperature_low_c(mut self, value: f64) -> Self {
        self.config.thresholds.temperature_low_c = value;
        self
    }

    pub fn temperature_high_c(mut self, value: f64) -> Self {
        self.config.thresholds.temperature_high_c = value;
        self
    }

    pub fn distress_moods(mut self, moods: impl IntoIterator<Item = Mood>) -> Self {
        self.config.thresholds.distress_moods = moods.into_iter().collect();
        self
    }

    pub fn temperature_policy(mut self, policy: AlertPolicy) -> Self {
        self.config.temperature_policy = policy;
        self
    }

    pub fn alert_cooldown_ms(mut self, cooldown_ms: i64) -> Self {
        self.config.alert_cooldown_ms = cooldown_ms;
        self
    }

    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = minutes;
        self
    }

    pub fn alarm_sound_asset(mut self, asset: impl Into<String>) -> Self {
        self.config.alarm_sound_asset = asset.into();
        self
    }

    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
