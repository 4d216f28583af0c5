// Edge-triggered alert controller
//
// Turns evaluator output into a bounded rate of externally visible alerts.
// The controller is synchronous and clock-free: every call carries the current
// epoch millis, and the result is a list of actions for the dispatcher.
//
// Per-kind policies:
// - Fall: strict edge. Rising edge fires and starts the alarm, falling edge
//   stops the alarm without firing.
// - Mood: edge with cooldown. Entry fires when the cooldown since the last
//   firing has elapsed; an entry inside the window is dropped and the
//   transition is not recorded. While the state persists it re-fires at most
//   once per window.
// - Temperature: configurable (see AlertPolicy), edge with cooldown by default.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::{AlertKind, NewAlert};
use crate::config::{AlertPolicy, MonitorConfig, Thresholds};
use crate::evaluator::{evaluate_detection, evaluate_mood, evaluate_reading, TemperatureBreach};
use crate::events::Notification;
use crate::reading::{Detection, Mood, Reading};

pub const FALL_TITLE: &str = "Fall Detected!";
pub const FALL_MESSAGE: &str = "A fall has been detected. Please check immediately!";
pub const TEMPERATURE_TITLE: &str = "Temperature Alert!";
pub const MOOD_TITLE: &str = "Emotional Distress Detected";

/// In-memory edge state of one alert kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EdgeState {
    pub active: bool,
    pub last_fired_at_ms: Option<i64>,
}

/// Outcome of feeding one sample into an edge state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Condition false and state inactive
    Idle,
    /// Alert fires
    Fired,
    /// Condition still true, firing suppressed
    Held,
    /// Entry inside the cooldown window, transition not recorded
    Dropped,
    /// Condition went false while active
    Cleared,
}

impl EdgeState {
    /// Advance the state for one sample
    pub fn step(
        &mut self,
        policy: AlertPolicy,
        condition: bool,
        now_ms: i64,
        cooldown_ms: i64,
    ) -> Transition {
        if !condition {
            return if self.active {
                self.active = false;
                Transition::Cleared
            } else {
                Transition::Idle
            };
        }

        match policy {
            AlertPolicy::Edge => {
                if self.active {
                    Transition::Held
                } else {
                    self.fire(now_ms)
                }
            }
            AlertPolicy::Level => self.fire(now_ms),
            AlertPolicy::EdgeWithCooldown => {
                let cooled_down = self
                    .last_fired_at_ms
                    .map_or(true, |last| now_ms.saturating_sub(last) >= cooldown_ms);
                if cooled_down {
                    self.fire(now_ms)
                } else if self.active {
                    Transition::Held
                } else {
                    Transition::Dropped
                }
            }
        }
    }

    fn fire(&mut self, now_ms: i64) -> Transition {
        self.active = true;
        self.last_fired_at_ms = Some(now_ms);
        Transition::Fired
    }
}

/// One externally visible alert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertFiring {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl AlertFiring {
    pub fn fall() -> Self {
        Self {
            kind: AlertKind::Fall,
            title: FALL_TITLE.to_string(),
            message: FALL_MESSAGE.to_string(),
        }
    }

    pub fn temperature(temperature: f64, breach: TemperatureBreach) -> Self {
        Self {
            kind: AlertKind::Temperature,
            title: TEMPERATURE_TITLE.to_string(),
            message: format!("Current temp: {}°C - {}", temperature, breach.label()),
        }
    }

    pub fn mood(mood: Mood) -> Self {
        Self {
            kind: AlertKind::Mood,
            title: MOOD_TITLE.to_string(),
            message: format!("Person appears to be {}", mood),
        }
    }

    /// Log entry for this firing
    pub fn to_alert(&self, timestamp: DateTime<Utc>) -> NewAlert {
        NewAlert::at(self.kind, self.message.clone(), timestamp)
    }

    /// Local notification for this firing
    pub fn to_notification(&self) -> Notification {
        Notification::new(self.title.clone(), self.message.clone())
    }
}

/// Decision produced by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum AlertAction {
    /// Write a log record, schedule a notification and raise an in-app alert
    Fire(AlertFiring),
    /// Start the looping fall alarm
    StartAlarm,
    /// Stop and unload the fall alarm
    StopAlarm,
}

/// Edge-triggered alert controller with per-kind state
#[derive(Debug, Clone)]
pub struct AlertController {
    thresholds: Thresholds,
    temperature_policy: AlertPolicy,
    cooldown_ms: i64,
    fall: EdgeState,
    temperature: EdgeState,
    mood: EdgeState,
}

impl AlertController {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            temperature_policy: config.temperature_policy,
            cooldown_ms: config.alert_cooldown_ms,
            fall: EdgeState::default(),
            temperature: EdgeState::default(),
            mood: EdgeState::default(),
        }
    }

    pub fn state(&self, kind: AlertKind) -> EdgeState {
        match kind {
            AlertKind::Fall => self.fall,
            AlertKind::Temperature => self.temperature,
            AlertKind::Mood => self.mood,
        }
    }

    pub fn temperature_policy(&self) -> AlertPolicy {
        self.temperature_policy
    }

    /// Process a sensor reading
    pub fn on_reading(&mut self, reading: &Reading, now_ms: i64) -> Vec<AlertAction> {
        let triggers = evaluate_reading(reading, &self.thresholds);
        let mut actions = self.step_fall(triggers.fall, now_ms);

        let transition = self.temperature.step(
            self.temperature_policy,
            triggers.temperature.is_some(),
            now_ms,
            self.cooldown_ms,
        );
        if let (Transition::Fired, Some(breach)) = (transition, triggers.temperature) {
            actions.push(AlertAction::Fire(AlertFiring::temperature(
                reading.temperature,
                breach,
            )));
        }
        actions
    }

    /// Process a mood sample
    pub fn on_mood(&mut self, mood: Mood, now_ms: i64) -> Vec<AlertAction> {
        let triggers = evaluate_mood(mood, &self.thresholds);
        self.step_mood(triggers.mood, now_ms)
    }

    /// Process a perception detection
    pub fn on_detection(&mut self, detection: &Detection, now_ms: i64) -> Vec<AlertAction> {
        let triggers = evaluate_detection(detection, &self.thresholds);
        let mut actions = self.step_fall(triggers.fall, now_ms);
        actions.extend(self.step_mood(triggers.mood, now_ms));
        actions
    }

    fn step_fall(&mut self, condition: bool, now_ms: i64) -> Vec<AlertAction> {
        match self.fall.step(AlertPolicy::Edge, condition, now_ms, self.cooldown_ms) {
            Transition::Fired => vec![
                AlertAction::StartAlarm,
                AlertAction::Fire(AlertFiring::fall()),
            ],
            Transition::Cleared => vec![AlertAction::StopAlarm],
            _ => Vec::new(),
        }
    }

    fn step_mood(&mut self, distress: Option<Mood>, now_ms: i64) -> Vec<AlertAction> {
        let transition = self.mood.step(
            AlertPolicy::EdgeWithCooldown,
            distress.is_some(),
            now_ms,
            self.cooldown_ms,
        );
        match (transition, distress) {
            (Transition::Fired, Some(mood)) => vec![AlertAction::Fire(AlertFiring::mood(mood))],
            (Transition::Dropped, Some(mood)) => {
                tracing::debug!(mood = %mood, "Mood alert inside cooldown window dropped");
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
