// Firebase Realtime Database client
//
// Implements ReadingSource and AlertLog from carewatch-core over the REST API:
// - GET    {root}/{path}.json                      one-off read
// - POST   {root}/alerts.json                      append, returns {"name": id}
// - DELETE {root}/alerts.json                      clear-all
// - GET    {root}/{path}.json  (text/event-stream) streaming subscription

use async_trait::async_trait;
use carewatch_core::traits::{AlertLog, AlertSnapshotStream, ReadingSource, ReadingStream};
use carewatch_core::{AlertRecord, MonitorError, NewAlert, Result};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::stream::{self, Stream, StreamExt};
use reqwest::{header, Client};
use serde_json::Value;
use std::pin::Pin;

use crate::config::FirebaseConfig;
use crate::models::{alerts_from_value, reading_from_value, PushResponse, StreamPayload};

pub const HOUSE_PATH: &str = "house";
pub const ALERTS_PATH: &str = "alerts";

type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;
type RawEvent = std::result::Result<Event, EventStreamError<reqwest::Error>>;
type RawEventStream = Pin<Box<dyn Stream<Item = RawEvent> + Send>>;

/// Firebase Realtime Database store
#[derive(Clone)]
pub struct FirebaseStore {
    client: Client,
    config: FirebaseConfig,
}

impl FirebaseStore {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a store from FIREBASE_DATABASE_URL / FIREBASE_AUTH_TOKEN
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(FirebaseConfig::from_env()?))
    }

    fn url(&self, path: &str) -> Result<url::Url> {
        self.config.path_url(path).map_err(MonitorError::Internal)
    }

    async fn get_value(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(|e| MonitorError::store(format!("GET {} failed: {}", path, e)))?;
        let response = check_status(response, path).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| MonitorError::store(format!("Invalid JSON from {}: {}", path, e)))
    }

    /// Open a streaming subscription and fold its deltas into full snapshots
    async fn stream_snapshots(&self, path: &str) -> Result<SnapshotStream> {
        let response = self
            .client
            .get(self.url(path)?)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| MonitorError::store(format!("Subscribe to {} failed: {}", path, e)))?;
        let response = check_status(response, path).await?;

        tracing::info!(path = %path, "Subscribed to realtime path");

        let events: RawEventStream = Box::pin(response.bytes_stream().eventsource());
        let state = SubscriptionState {
            path: path.to_string(),
            events,
            tree: Value::Null,
            done: false,
        };

        Ok(Box::pin(stream::unfold(state, next_snapshot)))
    }
}

async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(MonitorError::store(format!(
        "Request to {} failed with status {}: {}",
        path, status, error_text
    )))
}

struct SubscriptionState {
    path: String,
    events: RawEventStream,
    tree: Value,
    done: bool,
}

/// Result of applying one streaming event to the local tree
#[derive(Debug)]
pub(crate) enum StreamStep {
    /// The tree changed; emit a snapshot
    Snapshot,
    /// Nothing to emit (keep-alive, unknown or unreadable event)
    Ignore,
    /// The server closed the subscription
    Closed(MonitorError),
}

pub(crate) fn apply_stream_event(tree: &mut Value, event: &str, data: &str) -> StreamStep {
    match event {
        "put" | "patch" => match serde_json::from_str::<StreamPayload>(data) {
            Ok(payload) => {
                if event == "put" {
                    crate::tree::apply_put(tree, &payload.path, payload.data);
                } else {
                    crate::tree::apply_patch(tree, &payload.path, payload.data);
                }
                StreamStep::Snapshot
            }
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Unreadable stream payload");
                StreamStep::Ignore
            }
        },
        "keep-alive" => StreamStep::Ignore,
        "cancel" => StreamStep::Closed(MonitorError::store(format!(
            "Subscription cancelled by server: {}",
            data
        ))),
        "auth_revoked" => StreamStep::Closed(MonitorError::store("Auth token revoked")),
        other => {
            tracing::debug!(event = %other, "Ignoring unknown stream event");
            StreamStep::Ignore
        }
    }
}

async fn next_snapshot(mut state: SubscriptionState) -> Option<(Result<Value>, SubscriptionState)> {
    if state.done {
        return None;
    }
    loop {
        match state.events.next().await {
            None => {
                tracing::info!(path = %state.path, "Realtime stream ended");
                return None;
            }
            Some(Err(e)) => {
                state.done = true;
                let err = MonitorError::store(format!("Stream error on {}: {}", state.path, e));
                return Some((Err(err), state));
            }
            Some(Ok(event)) => match apply_stream_event(&mut state.tree, &event.event, &event.data)
            {
                StreamStep::Snapshot => {
                    let snapshot = state.tree.clone();
                    return Some((Ok(snapshot), state));
                }
                StreamStep::Ignore => continue,
                StreamStep::Closed(err) => {
                    tracing::warn!(path = %state.path, error = %err, "Realtime stream closed");
                    state.done = true;
                    return Some((Err(err), state));
                }
            },
        }
    }
}

#[async_trait]
impl ReadingSource for FirebaseStore {
    async fn subscribe_readings(&self) -> Result<ReadingStream> {
        let snapshots = self.stream_snapshots(HOUSE_PATH).await?;
        Ok(Box::pin(
            snapshots.map(|snapshot| snapshot.map(|value| reading_from_value(&value))),
        ))
    }
}

#[async_trait]
impl AlertLog for FirebaseStore {
    async fn append(&self, alert: NewAlert) -> Result<AlertRecord> {
        let response = self
            .client
            .post(self.url(ALERTS_PATH)?)
            .json(&alert)
            .send()
            .await
            .map_err(|e| MonitorError::store(format!("Append alert failed: {}", e)))?;
        let response = check_status(response, ALERTS_PATH).await?;
        let pushed: PushResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::store(format!("Invalid push response: {}", e)))?;

        tracing::debug!(alert_id = %pushed.name, kind = %alert.kind, "Alert appended");
        Ok(AlertRecord::from_new(pushed.name, alert))
    }

    async fn list(&self) -> Result<Vec<AlertRecord>> {
        let value = self.get_value(ALERTS_PATH).await?;
        Ok(alerts_from_value(&value))
    }

    async fn subscribe_alerts(&self) -> Result<AlertSnapshotStream> {
        let snapshots = self.stream_snapshots(ALERTS_PATH).await?;
        Ok(Box::pin(
            snapshots.map(|snapshot| snapshot.map(|value| alerts_from_value(&value))),
        ))
    }

    async fn clear(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.url(ALERTS_PATH)?)
            .send()
            .await
            .map_err(|e| MonitorError::store(format!("Clear alerts failed: {}", e)))?;
        check_status(response, ALERTS_PATH).await?;
        tracing::info!("Alert log cleared");
        Ok(())
    }
}
