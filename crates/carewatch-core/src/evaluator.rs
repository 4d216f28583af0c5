// Threshold evaluation
//
// Pure classification of readings and moods. Re-fire decisions belong to the
// controller; this module only answers "is this sample anomalous".

use crate::alert::AlertKind;
use crate::config::Thresholds;
use crate::reading::{Detection, Mood, Reading};

/// Direction of an out-of-range temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBreach {
    High,
    Low,
}

impl TemperatureBreach {
    pub fn label(&self) -> &'static str {
        match self {
            TemperatureBreach::High => "High Temperature!",
            TemperatureBreach::Low => "Low Temperature!",
        }
    }
}

/// Triggered flags for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triggers {
    pub fall: bool,
    pub temperature: Option<TemperatureBreach>,
    pub mood: Option<Mood>,
}

impl Triggers {
    pub fn is_empty(&self) -> bool {
        !self.fall && self.temperature.is_none() && self.mood.is_none()
    }

    pub fn kinds(&self) -> Vec<AlertKind> {
        let mut kinds = Vec::new();
        if self.temperature.is_some() {
            kinds.push(AlertKind::Temperature);
        }
        if self.fall {
            kinds.push(AlertKind::Fall);
        }
        if self.mood.is_some() {
            kinds.push(AlertKind::Mood);
        }
        kinds
    }
}

/// Classify the temperature of a reading
pub fn temperature_breach(temperature: f64, thresholds: &Thresholds) -> Option<TemperatureBreach> {
    if temperature > thresholds.temperature_high_c {
        Some(TemperatureBreach::High)
    } else if temperature < thresholds.temperature_low_c {
        Some(TemperatureBreach::Low)
    } else {
        None
    }
}

pub fn is_distress(mood: Mood, thresholds: &Thresholds) -> bool {
    thresholds.distress_moods.contains(&mood)
}

/// Evaluate a sensor reading (fall and temperature flags)
pub fn evaluate_reading(reading: &Reading, thresholds: &Thresholds) -> Triggers {
    Triggers {
        fall: reading.fall_detected,
        temperature: temperature_breach(reading.temperature, thresholds),
        mood: None,
    }
}

/// Evaluate a mood sample
pub fn evaluate_mood(mood: Mood, thresholds: &Thresholds) -> Triggers {
    Triggers {
        mood: is_distress(mood, thresholds).then_some(mood),
        ..Triggers::default()
    }
}

/// Evaluate a perception detection (fall and mood flags)
pub fn evaluate_detection(detection: &Detection, thresholds: &Thresholds) -> Triggers {
    Triggers {
        fall: detection.fall,
        temperature: None,
        mood: is_distress(detection.mood, thresholds).then_some(detection.mood),
    }
}
