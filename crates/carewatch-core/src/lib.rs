// Monitoring core
//
// This crate provides the store-agnostic part of the home monitor: sensor and
// mood types, threshold evaluation, the edge-triggered alert controller and the
// presenters for the dashboard and the alert log.
//
// Key design decisions:
// - Uses traits (ReadingSource, AlertLog, MoodSource, Notifier, AudioBackend) for
//   pluggable backends
// - The alert controller is pure: it returns AlertActions and the worker executes them
// - Time enters the controller as epoch millis so cooldown behavior is testable
// - In-memory implementations double as the demo backend

pub mod alert;
pub mod alert_log;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod reading;
pub mod traits;

// In-memory implementations for demo mode and testing
pub mod memory;

// Re-exports for convenience
pub use alert::{AlertFilter, AlertKind, AlertRecord, NewAlert};
pub use alert_log::{AlertDayGroup, AlertLogPresenter, AlertLogView};
pub use config::{AlertPolicy, MonitorConfig, MonitorConfigBuilder, Thresholds};
pub use controller::{AlertAction, AlertController, AlertFiring, EdgeState, Transition};
pub use dashboard::{ComfortLevel, ConnectionState, DashboardState, DashboardView, TemperatureBand};
pub use error::{MonitorError, Result};
pub use evaluator::{TemperatureBreach, Triggers};
pub use events::{MonitorEvent, Notification, PermissionStatus};
pub use reading::{Detection, Mood, MoodSample, Reading};
pub use traits::{
    AlertLog, AlertSnapshotStream, AudioBackend, Detector, MoodSource, Notifier, ReadingSource,
    ReadingStream, SoundHandle,
};
