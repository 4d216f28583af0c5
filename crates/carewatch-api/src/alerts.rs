// Alert log HTTP routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use carewatch_core::{AlertFilter, AlertLogView};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::services::AlertLogService;

/// App state for alert routes
#[derive(Clone)]
pub struct AppState {
    pub alert_log: Arc<AlertLogService>,
}

impl AppState {
    pub fn new(alert_log: Arc<AlertLogService>) -> Self {
        Self { alert_log }
    }
}

/// Query parameters for listing alerts
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAlertsQuery {
    /// `all` (default), `temperature`, `fall` or `mood`
    #[param(example = "fall")]
    pub filter: Option<String>,
}

/// Query parameters for clearing alerts
#[derive(Debug, Deserialize, IntoParams)]
pub struct ClearAlertsQuery {
    /// Must be `true`; clearing removes every alert regardless of filter
    #[serde(default)]
    #[param(example = true)]
    pub confirm: bool,
}

/// Create alert routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/alerts", get(list_alerts).delete(clear_alerts))
        .with_state(state)
}

/// GET /v1/alerts - Alert history grouped by day, newest first
#[utoipa::path(
    get,
    path = "/v1/alerts",
    params(ListAlertsQuery),
    responses(
        (status = 200, description = "Grouped alert log", body = AlertLogView),
        (status = 400, description = "Unknown filter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<AlertLogView>, StatusCode> {
    let filter: AlertFilter = query
        .filter
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let view = state.alert_log.view(filter).await.map_err(|e| {
        tracing::error!("Failed to load alerts: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(view))
}

/// DELETE /v1/alerts?confirm=true - Clear the whole alert log
///
/// Irreversible. Not scoped to any filter.
#[utoipa::path(
    delete,
    path = "/v1/alerts",
    params(ClearAlertsQuery),
    responses(
        (status = 204, description = "All alerts removed"),
        (status = 400, description = "Confirmation missing"),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn clear_alerts(
    State(state): State<AppState>,
    Query(query): Query<ClearAlertsQuery>,
) -> Result<StatusCode, StatusCode> {
    if !query.confirm {
        return Err(StatusCode::BAD_REQUEST);
    }

    state.alert_log.clear().await.map_err(|e| {
        tracing::error!("Failed to clear alerts: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(StatusCode::NO_CONTENT)
}
