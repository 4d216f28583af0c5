// Worker configuration
// Decision: Read everything from environment variables; unset values fall back to defaults
// in the getters so a bare `cargo run` starts a demo session against the in-memory store

use std::str::FromStr;
use std::time::Duration;

use carewatch_core::{AlertPolicy, MonitorConfigBuilder, MonitorError, Reading};

use crate::demo::parse_demo_readings;

/// Which realtime store backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// In-process store, no external services
    #[default]
    Memory,
    /// Firebase Realtime Database over REST
    Firebase,
}

impl FromStr for StoreKind {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "memory" | "in-memory" => Ok(StoreKind::Memory),
            "firebase" => Ok(StoreKind::Firebase),
            other => Err(MonitorError::config(format!("Unknown store: {}", other))),
        }
    }
}

/// Configuration for the monitor worker
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    /// Store backend name (`memory` or `firebase`)
    pub store: Option<String>,
    /// Base URL of the mood service; empty disables polling
    pub mood_service_url: Option<String>,
    /// Mood poll interval in milliseconds
    pub mood_poll_interval_ms: Option<u64>,
    /// Cooldown between two firings of the same alert kind
    pub alert_cooldown_ms: Option<i64>,
    /// Temperature re-fire policy (`edge`, `edge_only` or `level`)
    pub temperature_policy: Option<String>,
    pub temperature_low_c: Option<f64>,
    pub temperature_high_c: Option<f64>,
    /// Fixed offset used for day grouping in the alert log
    pub utc_offset_minutes: Option<i32>,
    /// Sound asset for the fall alarm
    pub alarm_sound_asset: Option<String>,
    /// Readings replayed into the in-memory store (`temp:humidity:fall,...`)
    pub demo_readings: Option<String>,
    pub demo_interval_ms: Option<u64>,
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = %name, value = %raw, "Ignoring unparsable environment value");
            None
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            store: std::env::var("CAREWATCH_STORE").ok(),
            mood_service_url: std::env::var("MOOD_SERVICE_URL").ok(),
            mood_poll_interval_ms: env_parse("MOOD_POLL_INTERVAL_MS"),
            alert_cooldown_ms: env_parse("ALERT_COOLDOWN_MS"),
            temperature_policy: std::env::var("TEMPERATURE_ALERT_POLICY").ok(),
            temperature_low_c: env_parse("TEMPERATURE_LOW_C"),
            temperature_high_c: env_parse("TEMPERATURE_HIGH_C"),
            utc_offset_minutes: env_parse("CAREWATCH_UTC_OFFSET_MINUTES"),
            alarm_sound_asset: std::env::var("ALARM_SOUND_ASSET").ok(),
            demo_readings: std::env::var("CAREWATCH_DEMO_READINGS").ok(),
            demo_interval_ms: env_parse("CAREWATCH_DEMO_INTERVAL_MS"),
        }
    }

    /// Get store backend with default
    pub fn store_kind(&self) -> Result<StoreKind, MonitorError> {
        self.store
            .as_deref()
            .map(StoreKind::from_str)
            .unwrap_or(Ok(StoreKind::Memory))
    }

    /// Get mood service URL with default; `None` when polling is disabled
    pub fn mood_service_url(&self) -> Option<String> {
        match self.mood_service_url.as_deref().map(str::trim) {
            Some("") => None,
            Some(url) => Some(url.to_string()),
            None => Some("http://localhost:5000".to_string()),
        }
    }

    /// Get mood poll interval with default
    pub fn mood_poll_interval(&self) -> Duration {
        Duration::from_millis(self.mood_poll_interval_ms.unwrap_or(2000).max(1))
    }

    /// Demo readings for the in-memory store; empty when unset
    pub fn demo_readings(&self) -> Result<Vec<Reading>, MonitorError> {
        match &self.demo_readings {
            Some(raw) => parse_demo_readings(raw),
            None => Ok(Vec::new()),
        }
    }

    /// Get demo feed interval with default
    pub fn demo_interval(&self) -> Duration {
        Duration::from_millis(self.demo_interval_ms.unwrap_or(5000).max(1))
    }

    /// Build the monitor configuration shared by the controller and presenters
    pub fn monitor_config(&self) -> Result<carewatch_core::MonitorConfig, MonitorError> {
        let mut builder = MonitorConfigBuilder::new();
        if let Some(policy) = &self.temperature_policy {
            builder = builder.temperature_policy(policy.parse::<AlertPolicy>()?);
        }
        if let Some(cooldown) = self.alert_cooldown_ms {
            if cooldown < 0 {
                return Err(MonitorError::config("ALERT_COOLDOWN_MS must not be negative"));
            }
            builder = builder.alert_cooldown_ms(cooldown);
        }
        if let Some(low) = self.temperature_low_c {
            builder = builder.temperature_low_c(low);
        }
        if let Some(high) = self.temperature_high_c {
            builder = builder.temperature_high_c(high);
        }
        if let Some(minutes) = self.utc_offset_minutes {
            builder = builder.utc_offset_minutes(minutes);
        }
        if let Some(asset) = &self.alarm_sound_asset {
            builder = builder.alarm_sound_asset(asset.clone());
        }

        let config = builder.build();
        if config.thresholds.temperature_low_c >= config.thresholds.temperature_high_c {
            return Err(MonitorError::config(
                "TEMPERATURE_LOW_C must be below TEMPERATURE_HIGH_C",
            ));
        }
        Ok(config)
    }
}
