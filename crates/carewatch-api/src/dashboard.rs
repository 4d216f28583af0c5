// Dashboard HTTP routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use carewatch_core::{DashboardView, MonitorError};
use carewatch_worker::SessionHandle;
use serde::Serialize;
use utoipa::ToSchema;

/// App state for dashboard routes
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    /// Live camera stream of the mood service, if configured
    pub video_feed_url: Option<String>,
}

/// Location of the live camera stream
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveStreamResponse {
    /// MJPEG stream URL, meant to be opened directly by a viewer
    #[schema(example = "http://192.168.1.20:5000/video_feed")]
    pub video_feed_url: String,
}

/// Create dashboard routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/dashboard", get(get_dashboard))
        .route("/v1/dashboard/retry", post(retry_dashboard))
        .route("/v1/dashboard/alarm/ack", post(acknowledge_alarm))
        .route("/v1/live-stream", get(get_live_stream))
        .with_state(state)
}

/// GET /v1/dashboard - Current readings, mood and derived indicators
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    responses(
        (status = 200, description = "Current dashboard", body = DashboardView)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.session.view())
}

/// POST /v1/dashboard/retry - Leave the "no data" screen
///
/// Only the loading flag is reset; the sensor subscription stays as it is.
#[utoipa::path(
    post,
    path = "/v1/dashboard/retry",
    responses(
        (status = 200, description = "Dashboard after retry", body = DashboardView)
    ),
    tag = "dashboard"
)]
pub async fn retry_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    state.session.retry();
    tracing::debug!("Dashboard retry requested");
    Json(state.session.view())
}

/// POST /v1/dashboard/alarm/ack - Silence the fall alarm
///
/// The ongoing fall stays recorded and does not fire again. A silent alarm
/// makes this a no-op.
#[utoipa::path(
    post,
    path = "/v1/dashboard/alarm/ack",
    responses(
        (status = 202, description = "Acknowledgement queued"),
        (status = 503, description = "Monitor session stopped")
    ),
    tag = "dashboard"
)]
pub async fn acknowledge_alarm(State(state): State<AppState>) -> StatusCode {
    match state.session.acknowledge_alarm() {
        Ok(()) => StatusCode::ACCEPTED,
        Err(MonitorError::SessionStopped) => StatusCode::SERVICE_UNAVAILABLE,
        Err(e) => {
            tracing::error!("Failed to acknowledge alarm: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /v1/live-stream - Live camera stream location
#[utoipa::path(
    get,
    path = "/v1/live-stream",
    responses(
        (status = 200, description = "Live stream location", body = LiveStreamResponse),
        (status = 404, description = "Mood service not configured")
    ),
    tag = "dashboard"
)]
pub async fn get_live_stream(
    State(state): State<AppState>,
) -> Result<Json<LiveStreamResponse>, StatusCode> {
    let video_feed_url = state.video_feed_url.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(LiveStreamResponse { video_feed_url }))
}
