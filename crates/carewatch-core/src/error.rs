// Error types for monitoring operations

use thiserror::Error;

/// Result type alias for monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while monitoring
///
/// None of these are fatal to a monitoring session: callers log them and keep
/// the last known state.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Realtime store error (subscription, append or clear)
    #[error("Store error: {0}")]
    Store(String),

    /// Mood service error (request failed or payload unreadable)
    #[error("Mood service error: {0}")]
    Mood(String),

    /// Notification scheduling error
    #[error("Notification error: {0}")]
    Notification(String),

    /// Audio playback error
    #[error("Audio error: {0}")]
    Audio(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown alert log filter
    #[error("Invalid alert filter: {0}")]
    InvalidFilter(String),

    /// The monitor session is no longer running
    #[error("Monitor session stopped")]
    SessionStopped,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MonitorError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        MonitorError::Store(msg.into())
    }

    /// Create a mood service error
    pub fn mood(msg: impl Into<String>) -> Self {
        MonitorError::Mood(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        MonitorError::Notification(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        MonitorError::Audio(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Configuration(msg.into())
    }
}
