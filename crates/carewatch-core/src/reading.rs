// Sensor readings and mood samples
//
// Readings are published by the house sensor hub under `house/` using the
// field names `temp`, `humidity` and `fall_detection`. Mood samples come from
// the inference service as `{ "mood": "<label>" }` with arbitrary casing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latest ambient reading from the house sensor hub
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Reading {
    /// Temperature in degrees Celsius
    #[serde(rename = "temp")]
    pub temperature: f64,

    /// Relative humidity in percent
    pub humidity: f64,

    /// Whether the fall detector currently reports a fall
    #[serde(rename = "fall_detection", default)]
    pub fall_detected: bool,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, fall_detected: bool) -> Self {
        Self {
            temperature,
            humidity,
            fall_detected,
        }
    }
}

/// Mood label produced by the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    Neutral,
    #[default]
    Unknown,
}

impl Mood {
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Fear,
        Mood::Surprise,
        Mood::Disgust,
        Mood::Neutral,
        Mood::Unknown,
    ];

    /// Parse a label case-insensitively; unrecognized labels become `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "happy" => Mood::Happy,
            "sad" => Mood::Sad,
            "angry" => Mood::Angry,
            "fear" => Mood::Fear,
            "surprise" => Mood::Surprise,
            "disgust" => Mood::Disgust,
            "neutral" => Mood::Neutral,
            _ => Mood::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Fear => "fear",
            Mood::Surprise => "surprise",
            Mood::Disgust => "disgust",
            Mood::Neutral => "neutral",
            Mood::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Mood::from_label(s))
    }
}

/// One mood poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MoodSample {
    #[serde(deserialize_with = "deserialize_mood_label")]
    pub mood: Mood,
}

impl MoodSample {
    pub fn new(mood: Mood) -> Self {
        Self { mood }
    }
}

fn deserialize_mood_label<'de, D>(deserializer: D) -> std::result::Result<Mood, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    Ok(Mood::from_label(&label))
}

/// Output of the perception pipeline for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detection {
    pub fall: bool,
    pub mood: Mood,
}
