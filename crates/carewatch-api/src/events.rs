// Monitor event streaming (SSE)
// Events are notifications streamed to clients, NOT stored
//
// Each connection receives:
// - `dashboard` events with the current DashboardView, first on connect and then on every change
// - alert and alarm events broadcast by the session (`alert_raised`, `alarm_started`, ...)

use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Router,
};
use carewatch_core::MonitorEvent;
use carewatch_worker::SessionHandle;
use futures::{
    future,
    stream::{self, Stream},
    StreamExt,
};
use std::convert::Infallible;
use tokio::sync::watch;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream, WatchStream};

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    /// Flips to true when the server shuts down; open streams end
    pub shutdown: watch::Receiver<bool>,
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/events/sse", get(stream_events))
        .with_state(state)
}

/// GET /v1/events/sse - Stream dashboard updates and alerts
#[utoipa::path(
    get,
    path = "/v1/events/sse",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream")
    ),
    tag = "events"
)]
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    tracing::info!("Starting monitor event stream");

    let session = state.session.clone();
    let dashboard = WatchStream::new(state.session.watch_dashboard()).map(move |_| {
        let view = session.view();
        let json = serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, Infallible>(SseEvent::default().event("dashboard").data(json))
    });

    let alerts = BroadcastStream::new(state.session.subscribe_events()).filter_map(|item| {
        future::ready(match item {
            Ok(event) => Some(Ok::<_, Infallible>(monitor_event_to_sse(&event))),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream subscriber lagged");
                None
            }
        })
    });

    let mut shutdown = state.shutdown.clone();
    let stream = stream::select(dashboard, alerts).take_until(async move {
        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn monitor_event_to_sse(event: &MonitorEvent) -> SseEvent {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    SseEvent::default().event(event.name()).data(json)
}
