// Core traits for pluggable backends
//
// These traits let the monitor run against different collaborators:
// - In-memory implementations for tests and demo mode
// - A Firebase Realtime Database client for production
// - Log-backed notification and audio adapters on headless hosts

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::alert::{AlertRecord, NewAlert};
use crate::error::Result;
use crate::events::{Notification, PermissionStatus};
use crate::reading::{Detection, MoodSample, Reading};

/// Stream of `house/` snapshots; `None` when the path holds no data
pub type ReadingStream = Pin<Box<dyn Stream<Item = Result<Option<Reading>>> + Send>>;

/// Stream of complete `alerts/` snapshots
pub type AlertSnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<AlertRecord>>> + Send>>;

// ============================================================================
// ReadingSource - Realtime sensor feed
// ============================================================================

/// Source of live sensor readings
///
/// Implementations deliver the current value first and then every change,
/// in store order. Dropping the stream cancels the subscription.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn subscribe_readings(&self) -> Result<ReadingStream>;
}

// ============================================================================
// AlertLog - Append-only alert store
// ============================================================================

/// Append-only alert log with bulk clear
#[async_trait]
pub trait AlertLog: Send + Sync {
    /// Append a record; the store assigns the id
    async fn append(&self, alert: NewAlert) -> Result<AlertRecord>;

    /// Current complete set of records, in no particular order
    async fn list(&self) -> Result<Vec<AlertRecord>>;

    /// Subscribe to complete snapshots, current value first
    async fn subscribe_alerts(&self) -> Result<AlertSnapshotStream>;

    /// Remove every record under the log namespace
    async fn clear(&self) -> Result<()>;
}

// ============================================================================
// MoodSource - Polled inference endpoint
// ============================================================================

#[async_trait]
pub trait MoodSource: Send + Sync {
    /// Fetch the current mood once
    async fn fetch_mood(&self) -> Result<MoodSample>;
}

// ============================================================================
// Notifier - Local notification scheduler
// ============================================================================

/// Fire-and-forget notification scheduler
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask for permission to deliver notifications
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    /// Schedule one notification
    async fn schedule(&self, notification: Notification) -> Result<()>;
}

// ============================================================================
// AudioBackend - Local audio playback
// ============================================================================

/// Handle to a loaded sound
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub String);

/// Platform audio playback
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn load(&self, asset: &str) -> Result<SoundHandle>;

    async fn play(&self, handle: &SoundHandle, looping: bool) -> Result<()>;

    async fn stop(&self, handle: &SoundHandle) -> Result<()>;

    async fn unload(&self, handle: SoundHandle) -> Result<()>;
}

// ============================================================================
// Detector - Perception pipeline
// ============================================================================

/// Fall and mood detection over one camera frame
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, frame: &[u8]) -> Result<Detection>;
}
