// Host adapters for monitor ports
//
// These implementations connect the monitor abstractions to what a headless
// host actually has: the configured realtime store, the mood service, and
// tracing output in place of a notification center and speakers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use carewatch_core::memory::InMemoryStore;
use carewatch_core::{
    AlertLog, AudioBackend, Notification, Notifier, PermissionStatus, ReadingSource, Result,
    SoundHandle,
};
use carewatch_storage::FirebaseStore;
use tracing::info;

use crate::config::{StoreKind, WorkerConfig};
use crate::mood_client::HttpMoodSource;

// ============================================================================
// TracingNotifier - Delivers notifications to the log
// ============================================================================

/// Notifier that writes each notification to the log after its delay
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    permission: PermissionStatus,
}

impl TracingNotifier {
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self { permission }
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn schedule(&self, notification: Notification) -> Result<()> {
        let delay = Duration::from_secs(notification.delay_seconds);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(
                title = %notification.title,
                body = %notification.body,
                sound = %notification.sound,
                "Notification delivered"
            );
        });
        Ok(())
    }
}

// ============================================================================
// TracingAudio - Logs playback instead of playing sound
// ============================================================================

#[derive(Debug, Default)]
pub struct TracingAudio {
    next_handle: AtomicU64,
}

impl TracingAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioBackend for TracingAudio {
    async fn load(&self, asset: &str) -> Result<SoundHandle> {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = SoundHandle(format!("{}#{}", asset, id));
        info!(asset = %asset, handle = %handle.0, "Sound loaded");
        Ok(handle)
    }

    async fn play(&self, handle: &SoundHandle, looping: bool) -> Result<()> {
        info!(handle = %handle.0, looping, "Sound playing");
        Ok(())
    }

    async fn stop(&self, handle: &SoundHandle) -> Result<()> {
        info!(handle = %handle.0, "Sound stopped");
        Ok(())
    }

    async fn unload(&self, handle: SoundHandle) -> Result<()> {
        info!(handle = %handle.0, "Sound unloaded");
        Ok(())
    }
}

// ============================================================================
// Store and mood source selection
// ============================================================================

/// Store handles for a session
#[derive(Clone)]
pub struct StoreBackends {
    pub readings: Arc<dyn ReadingSource>,
    pub alerts: Arc<dyn AlertLog>,
    /// Set when running against the in-memory store
    pub memory: Option<InMemoryStore>,
}

/// Create the configured store backend
pub fn create_store_backends(config: &WorkerConfig) -> anyhow::Result<StoreBackends> {
    match config.store_kind()? {
        StoreKind::Memory => {
            info!("Using in-memory store");
            let store = InMemoryStore::new();
            Ok(StoreBackends {
                readings: Arc::new(store.clone()),
                alerts: Arc::new(store.clone()),
                memory: Some(store),
            })
        }
        StoreKind::Firebase => {
            let store = FirebaseStore::from_env().context("Failed to configure Firebase store")?;
            info!("Using Firebase Realtime Database store");
            let store = Arc::new(store);
            Ok(StoreBackends {
                readings: store.clone(),
                alerts: store,
                memory: None,
            })
        }
    }
}

/// Create the mood source, or `None` when polling is disabled
pub fn create_mood_source(config: &WorkerConfig) -> anyhow::Result<Option<HttpMoodSource>> {
    match config.mood_service_url() {
        Some(url) => {
            let source = HttpMoodSource::new(&url)?;
            info!(url = %url, "Mood polling enabled");
            Ok(Some(source))
        }
        None => {
            info!("Mood polling disabled");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracing_audio_handles_are_unique() {
        let audio = TracingAudio::new();
        let a = audio.load("alarm.mp3").await.unwrap();
        let b = audio.load("alarm.mp3").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_memory_backends_share_one_store() {
        let backends = create_store_backends(&WorkerConfig::default()).unwrap();
        let memory = backends.memory.clone().unwrap();

        backends
            .alerts
            .append(carewatch_core::NewAlert::now(
                carewatch_core::AlertKind::Fall,
                "fall",
            ))
            .await
            .unwrap();
        assert_eq!(memory.alert_count(), 1);
    }

    #[test]
    fn test_mood_source_disabled() {
        let config = WorkerConfig {
            mood_service_url: Some(String::new()),
            ..Default::default()
        };
        assert!(create_mood_source(&config).unwrap().is_none());
    }
}
