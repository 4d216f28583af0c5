// In-memory implementations for demo mode and testing
//
// These implementations keep all data in memory, making them suitable for:
// - Running the worker and API without a realtime database
// - Unit and integration tests
// - Scripting sensor and mood sequences

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use uuid::Uuid;

use crate::alert::{AlertRecord, NewAlert};
use crate::error::{MonitorError, Result};
use crate::events::{Notification, PermissionStatus};
use crate::reading::{Detection, MoodSample, Reading};
use crate::traits::{
    AlertLog, AlertSnapshotStream, AudioBackend, Detector, MoodSource, Notifier, ReadingSource,
    ReadingStream, SoundHandle,
};

// ============================================================================
// InMemoryStore - Realtime store with `house/` and `alerts/`
// ============================================================================

/// `house/` record and one queue per live subscriber
#[derive(Default)]
struct HouseFeed {
    current: Option<Reading>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Reading>>>,
}

impl HouseFeed {
    fn publish(&mut self, value: Option<Reading>) {
        self.current = value;
        // Dropped streams are pruned on the next publish
        self.subscribers.retain(|tx| tx.send(value).is_ok());
    }
}

struct StoreInner {
    house: Mutex<HouseFeed>,
    alerts: watch::Sender<BTreeMap<String, AlertRecord>>,
    fail_writes: AtomicBool,
}

/// In-memory realtime store
///
/// Reading subscribers receive the current value on subscribe and then every
/// publish in order, each on its own queue. Alert subscribers receive complete
/// snapshots, so intermediate alert sets may be skipped. Alert ids are UUID v7
/// strings, so key order is creation order.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (alerts, _) = watch::channel(BTreeMap::new());
        Self {
            inner: Arc::new(StoreInner {
                house: Mutex::new(HouseFeed::default()),
                alerts,
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Publish a reading under `house/`
    pub fn set_reading(&self, reading: Reading) {
        self.inner.house.lock().publish(Some(reading));
    }

    /// Remove the `house/` record
    pub fn clear_reading(&self) {
        self.inner.house.lock().publish(None);
    }

    /// Make appends and clears fail (simulates an unreachable store)
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Pre-populate with records (useful for testing)
    pub fn seed(&self, records: Vec<AlertRecord>) {
        self.inner.alerts.send_modify(|alerts| {
            for record in records {
                alerts.insert(record.id.clone(), record);
            }
        });
    }

    pub fn alert_count(&self) -> usize {
        self.inner.alerts.borrow().len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(MonitorError::store("store unavailable"));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for InMemoryStore {
    async fn subscribe_readings(&self) -> Result<ReadingStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut house = self.inner.house.lock();
            // Current value first; queued under the lock so no publish can overtake it
            let _ = tx.send(house.current);
            house.subscribers.push(tx);
        }
        let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, MonitorError>);
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl AlertLog for InMemoryStore {
    async fn append(&self, alert: NewAlert) -> Result<AlertRecord> {
        self.check_writable()?;
        let record = AlertRecord::from_new(Uuid::now_v7().to_string(), alert);
        let stored = record.clone();
        self.inner.alerts.send_modify(|alerts| {
            alerts.insert(stored.id.clone(), stored);
        });
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<AlertRecord>> {
        Ok(self.inner.alerts.borrow().values().cloned().collect())
    }

    async fn subscribe_alerts(&self) -> Result<AlertSnapshotStream> {
        let stream = WatchStream::new(self.inner.alerts.subscribe())
            .map(|alerts| Ok::<_, MonitorError>(alerts.into_values().collect()));
        Ok(Box::pin(stream))
    }

    async fn clear(&self) -> Result<()> {
        self.check_writable()?;
        self.inner.alerts.send_modify(|alerts| alerts.clear());
        Ok(())
    }
}

// ============================================================================
// RecordingNotifier - Collects scheduled notifications
// ============================================================================

/// Notifier that records every scheduled notification
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    permission: PermissionStatus,
    fail_schedule: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            permission,
            fail_schedule: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Make scheduling fail (simulates a broken notification center)
    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn schedule(&self, notification: Notification) -> Result<()> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(MonitorError::notification(format!(
                "cannot schedule '{}'",
                notification.title
            )));
        }
        self.sent.lock().push(notification);
        Ok(())
    }
}

// ============================================================================
// RecordingAudio - Collects playback calls
// ============================================================================

/// Audio call observed by RecordingAudio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Load(String),
    Play { handle: SoundHandle, looping: bool },
    Stop(SoundHandle),
    Unload(SoundHandle),
}

/// Audio backend that records calls instead of playing sound
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Arc<Mutex<Vec<AudioCall>>>,
    fail_play: Arc<AtomicBool>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().clone()
    }

    /// Make `play` fail (simulates a missing output device)
    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Number of `play` calls
    pub fn play_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, AudioCall::Play { .. }))
            .count()
    }

    /// Loaded handles that have not been unloaded yet
    pub fn loaded(&self) -> usize {
        self.calls.lock().iter().fold(0usize, |n, call| match call {
            AudioCall::Load(_) => n + 1,
            AudioCall::Unload(_) => n.saturating_sub(1),
            _ => n,
        })
    }
}

#[async_trait]
impl AudioBackend for RecordingAudio {
    async fn load(&self, asset: &str) -> Result<SoundHandle> {
        let mut calls = self.calls.lock();
        calls.push(AudioCall::Load(asset.to_string()));
        Ok(SoundHandle(format!("{}#{}", asset, calls.len())))
    }

    async fn play(&self, handle: &SoundHandle, looping: bool) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(MonitorError::audio(format!("cannot play {}", handle.0)));
        }
        self.calls.lock().push(AudioCall::Play {
            handle: handle.clone(),
            looping,
        });
        Ok(())
    }

    async fn stop(&self, handle: &SoundHandle) -> Result<()> {
        self.calls.lock().push(AudioCall::Stop(handle.clone()));
        Ok(())
    }

    async fn unload(&self, handle: SoundHandle) -> Result<()> {
        self.calls.lock().push(AudioCall::Unload(handle));
        Ok(())
    }
}

// ============================================================================
// ScriptedMoodSource - Replays a fixed sequence of mood results
// ============================================================================

/// Mood source that replays scripted results, repeating the last one
pub struct ScriptedMoodSource {
    script: Mutex<VecDeque<std::result::Result<MoodSample, String>>>,
    last: Mutex<Option<std::result::Result<MoodSample, String>>>,
}

impl ScriptedMoodSource {
    pub fn new(script: impl IntoIterator<Item = std::result::Result<MoodSample, String>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    /// Always answer with the same sample
    pub fn constant(sample: MoodSample) -> Self {
        Self::new([Ok(sample)])
    }
}

#[async_trait]
impl MoodSource for ScriptedMoodSource {
    async fn fetch_mood(&self) -> Result<MoodSample> {
        let next = self.script.lock().pop_front();
        let result = match next {
            Some(result) => {
                *self.last.lock() = Some(result.clone());
                result
            }
            None => self
                .last
                .lock()
                .clone()
                .unwrap_or_else(|| Err("mood script is empty".to_string())),
        };
        result.map_err(MonitorError::mood)
    }
}

// ============================================================================
// ScriptedDetector - Returns canned detections
// ============================================================================

/// Detector that returns scripted detections in order, then the default
#[derive(Default)]
pub struct ScriptedDetector {
    script: Mutex<VecDeque<Detection>>,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(&self, _frame: &[u8]) -> Result<Detection> {
        Ok(self.script.lock().pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use crate::reading::Mood;

    #[tokio::test]
    async fn test_reading_subscription_delivers_current_then_changes() {
        let store = InMemoryStore::new();
        store.set_reading(Reading::new(20.0, 40.0, false));

        let mut stream = store.subscribe_readings().await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Some(Reading::new(20.0, 40.0, false)));

        store.set_reading(Reading::new(41.0, 40.0, false));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.unwrap().temperature, 41.0);
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_every_publish_in_order() {
        let store = InMemoryStore::new();
        let mut early = store.subscribe_readings().await.unwrap();

        store.set_reading(Reading::new(41.0, 40.0, false));
        store.set_reading(Reading::new(42.0, 40.0, true));
        let mut late = store.subscribe_readings().await.unwrap();
        store.clear_reading();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(early.next().await.unwrap().unwrap());
        }
        assert_eq!(
            seen,
            vec![
                None,
                Some(Reading::new(41.0, 40.0, false)),
                Some(Reading::new(42.0, 40.0, true)),
                None,
            ]
        );

        assert_eq!(
            late.next().await.unwrap().unwrap(),
            Some(Reading::new(42.0, 40.0, true))
        );
        assert_eq!(late.next().await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_assigns_ids_and_notifies_subscribers() {
        let store = InMemoryStore::new();
        let mut snapshots = store.subscribe_alerts().await.unwrap();
        assert!(snapshots.next().await.unwrap().unwrap().is_empty());

        let first = store.append(NewAlert::now(AlertKind::Fall, "fall")).await.unwrap();
        let second = store.append(NewAlert::now(AlertKind::Fall, "fall")).await.unwrap();
        assert_ne!(first.id, second.id);

        let snapshot = snapshots.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = InMemoryStore::new();
        store.append(NewAlert::now(AlertKind::Mood, "sad")).await.unwrap();
        store
            .append(NewAlert::now(AlertKind::Temperature, "hot"))
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);
        let err = store
            .append(NewAlert::now(AlertKind::Fall, "fall"))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Store(_)));
        assert_eq!(store.alert_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_mood_repeats_last() {
        let source = ScriptedMoodSource::new([
            Ok(MoodSample::new(Mood::Happy)),
            Err("timeout".to_string()),
            Ok(MoodSample::new(Mood::Sad)),
        ]);
        assert_eq!(source.fetch_mood().await.unwrap().mood, Mood::Happy);
        assert!(source.fetch_mood().await.is_err());
        assert_eq!(source.fetch_mood().await.unwrap().mood, Mood::Sad);
        assert_eq!(source.fetch_mood().await.unwrap().mood, Mood::Sad);
    }

    #[tokio::test]
    async fn test_recording_audio_tracks_loaded_handles() {
        let audio = RecordingAudio::new();
        let handle = audio.load("alarm.mp3").await.unwrap();
        audio.play(&handle, true).await.unwrap();
        assert_eq!(audio.loaded(), 1);
        audio.stop(&handle).await.unwrap();
        audio.unload(handle).await.unwrap();
        assert_eq!(audio.loaded(), 0);
        assert_eq!(audio.play_count(), 1);
    }
}
