// Fall alarm slot
//
// The looping alarm sound is owned by one session. Starting it while it is
// already playing is a no-op; stopping unloads the sound. Sessions call
// `release` on every exit path so no handle outlives them.

use std::sync::Arc;

use carewatch_core::{AudioBackend, Result, SoundHandle};

pub struct AlarmSlot {
    audio: Arc<dyn AudioBackend>,
    asset: String,
    handle: Option<SoundHandle>,
}

impl AlarmSlot {
    pub fn new(audio: Arc<dyn AudioBackend>, asset: impl Into<String>) -> Self {
        Self {
            audio,
            asset: asset.into(),
            handle: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_some()
    }

    /// Load and loop the alarm; returns false if it was already playing
    pub async fn start(&mut self) -> Result<bool> {
        if self.handle.is_some() {
            return Ok(false);
        }

        let handle = self.audio.load(&self.asset).await?;
        if let Err(e) = self.audio.play(&handle, true).await {
            if let Err(unload_err) = self.audio.unload(handle).await {
                tracing::warn!(error = %unload_err, "Failed to unload alarm after play error");
            }
            return Err(e);
        }

        tracing::info!(asset = %self.asset, handle = %handle.0, "Alarm started");
        self.handle = Some(handle);
        Ok(true)
    }

    /// Stop and unload the alarm; returns false if nothing was playing
    pub async fn stop(&mut self) -> Result<bool> {
        let Some(handle) = self.handle.take() else {
            return Ok(false);
        };

        // Unload even when stop fails so the handle is not leaked
        let stopped = self.audio.stop(&handle).await;
        let unloaded = self.audio.unload(handle).await;
        stopped?;
        unloaded?;

        tracing::info!("Alarm stopped");
        Ok(true)
    }

    /// Stop the alarm if playing, logging any failure
    pub async fn release(&mut self) {
        if let Err(e) = self.stop().await {
            tracing::warn!(error = %e, "Failed to release alarm");
        }
    }
}
