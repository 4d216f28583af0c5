// Shared fixtures for route tests

use std::sync::Arc;

use carewatch_core::memory::{InMemoryStore, RecordingAudio, RecordingNotifier};
use carewatch_core::MonitorConfig;
use carewatch_worker::{MonitorSession, SessionDeps};
use http_body_util::BodyExt;

/// Session over a fresh in-memory store (not running)
pub fn test_session() -> (MonitorSession, InMemoryStore) {
    let store = InMemoryStore::new();
    let session = MonitorSession::new(
        &MonitorConfig::default(),
        SessionDeps {
            readings: Arc::new(store.clone()),
            alerts: Arc::new(store.clone()),
            mood: None,
            notifier: Arc::new(RecordingNotifier::new()),
            audio: Arc::new(RecordingAudio::new()),
        },
    );
    (session, store)
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
