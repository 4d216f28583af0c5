// Live dashboard state and derived indicators

use serde::Serialize;

use crate::config::Thresholds;
use crate::evaluator::is_distress;
use crate::reading::{Mood, Reading};

const GAUGE_MIN_C: f64 = -10.0;
const GAUGE_MAX_C: f64 = 50.0;

/// Connection state of the sensor feed as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Waiting for the first snapshot
    #[default]
    Connecting,
    /// A reading has been received
    Live,
    /// The feed answered without data or failed
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ComfortLevel {
    #[serde(rename = "Very Humid & Hot")]
    VeryHumidAndHot,
    Comfortable,
    #[serde(rename = "Cold & Dry")]
    ColdAndDry,
    Moderate,
}

impl ComfortLevel {
    pub fn from_reading(reading: &Reading) -> Self {
        let (temp, humidity) = (reading.temperature, reading.humidity);
        if temp > 30.0 && humidity > 70.0 {
            ComfortLevel::VeryHumidAndHot
        } else if (20.0..=25.0).contains(&temp) && (40.0..=60.0).contains(&humidity) {
            ComfortLevel::Comfortable
        } else if temp < 15.0 && humidity < 40.0 {
            ComfortLevel::ColdAndDry
        } else {
            ComfortLevel::Moderate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    Hot,
    Warm,
    Mild,
    Cold,
}

impl TemperatureBand {
    pub fn from_celsius(temp: f64) -> Self {
        if temp > 30.0 {
            TemperatureBand::Hot
        } else if temp >= 20.0 {
            TemperatureBand::Warm
        } else if temp >= 10.0 {
            TemperatureBand::Mild
        } else {
            TemperatureBand::Cold
        }
    }
}

/// Temperature gauge fill in percent over -10..50 °C
pub fn temperature_gauge_position(temp: f64) -> f64 {
    let percentage = (temp - GAUGE_MIN_C) / (GAUGE_MAX_C - GAUGE_MIN_C) * 100.0;
    percentage.clamp(0.0, 100.0)
}

pub fn humidity_gauge_position(humidity: f64) -> f64 {
    humidity.clamp(0.0, 100.0)
}

/// Mutable dashboard state held by a monitor session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    pub connection: ConnectionState,
    pub reading: Option<Reading>,
    pub mood: Mood,
    pub alarm_active: bool,
}

impl DashboardState {
    pub fn apply_reading(&mut self, reading: Reading) {
        self.reading = Some(reading);
        self.connection = ConnectionState::Live;
    }

    /// Snapshot arrived without a reading (or the feed failed)
    pub fn mark_no_data(&mut self) {
        if self.reading.is_none() {
            self.connection = ConnectionState::NoData;
        }
    }

    /// Retry only resets the loading flag; the subscription is left as is
    pub fn retry(&mut self) {
        if self.connection == ConnectionState::NoData {
            self.connection = ConnectionState::Connecting;
        }
    }

    pub fn view(&self, thresholds: &Thresholds) -> DashboardView {
        DashboardView {
            connection: self.connection,
            reading: self.reading,
            mood: self.mood,
            alarm_active: self.alarm_active,
            comfort: self.reading.as_ref().map(ComfortLevel::from_reading),
            temperature_band: self
                .reading
                .map(|r| TemperatureBand::from_celsius(r.temperature)),
            temperature_gauge: self
                .reading
                .map(|r| temperature_gauge_position(r.temperature)),
            humidity_gauge: self.reading.map(|r| humidity_gauge_position(r.humidity)),
            distress: is_distress(self.mood, thresholds),
        }
    }
}

/// Dashboard with derived indicators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardView {
    pub connection: ConnectionState,
    pub reading: Option<Reading>,
    pub mood: Mood,
    pub alarm_active: bool,
    pub comfort: Option<ComfortLevel>,
    pub temperature_band: Option<TemperatureBand>,
    /// Percent fill of the temperature gauge
    pub temperature_gauge: Option<f64>,
    /// Percent fill of the humidity gauge
    pub humidity_gauge: Option<f64>,
    /// Mood indicates emotional distress
    pub distress: bool,
}
