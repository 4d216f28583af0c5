// Carewatch API server
// Decision: The monitor session runs in this process; routes read its state through a SessionHandle
// Decision: Alert history comes from the store subscription, mirrored by AlertLogService

mod alerts;
mod dashboard;
mod events;
mod services;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use carewatch_core::alert_log::offset_from_minutes;
use carewatch_core::*;
use carewatch_worker::{
    create_mood_source, create_store_backends, spawn_demo_feed, MonitorSession, SessionDeps,
    TracingAudio, TracingNotifier, WorkerConfig,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::services::AlertLogService;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    store: String,
    mood_polling: bool,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.clone(),
        mood_polling: state.mood_polling,
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    store: String,
    mood_polling: bool,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard::get_dashboard,
        dashboard::retry_dashboard,
        dashboard::acknowledge_alarm,
        dashboard::get_live_stream,
        alerts::list_alerts,
        alerts::clear_alerts,
        events::stream_events,
    ),
    components(
        schemas(
            DashboardView, ConnectionState, ComfortLevel, TemperatureBand,
            Reading, Mood,
            AlertLogView, AlertDayGroup, AlertRecord, AlertKind,
            MonitorEvent,
            dashboard::LiveStreamResponse,
        )
    ),
    tags(
        (name = "dashboard", description = "Live readings, mood and alarm state"),
        (name = "alerts", description = "Alert history"),
        (name = "events", description = "Event streaming endpoints (SSE)")
    ),
    info(
        title = "Carewatch API",
        version = "0.1.0",
        description = "API for monitoring a home: sensor readings, mood, alerts and the fall alarm",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carewatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("carewatch-api starting...");

    // Load monitor configuration from environment
    let worker_config = WorkerConfig::from_env();
    let monitor_config = worker_config
        .monitor_config()
        .context("Invalid monitor configuration")?;
    let offset = offset_from_minutes(monitor_config.utc_offset_minutes)
        .context("Invalid CAREWATCH_UTC_OFFSET_MINUTES")?;

    let stores = create_store_backends(&worker_config)?;
    let demo_readings = worker_config
        .demo_readings()
        .context("Invalid CAREWATCH_DEMO_READINGS")?;
    let mood_source = create_mood_source(&worker_config)?;
    let video_feed_url = mood_source
        .as_ref()
        .map(|source| source.video_feed_url())
        .transpose()?
        .map(|url| url.to_string());
    let mood_polling = mood_source.is_some();
    let mood = mood_source.map(|source| {
        (
            Arc::new(source) as Arc<dyn MoodSource>,
            worker_config.mood_poll_interval(),
        )
    });

    // Start the monitor session
    let session = MonitorSession::new(
        &monitor_config,
        SessionDeps {
            readings: stores.readings.clone(),
            alerts: stores.alerts.clone(),
            mood,
            notifier: Arc::new(TracingNotifier::new()),
            audio: Arc::new(TracingAudio::new()),
        },
    );
    let session_handle = session.handle();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let session_task = tokio::spawn(session.run(shutdown_rx.clone()));

    // Mirror the alert log
    let alert_log = Arc::new(AlertLogService::new(stores.alerts.clone(), offset));
    let sync_task = alert_log.spawn_sync(shutdown_rx.clone());

    // Replay demo readings when there is no sensor hub
    let demo_task = match stores.memory.clone() {
        Some(store) if !demo_readings.is_empty() => Some(spawn_demo_feed(
            store,
            demo_readings,
            worker_config.demo_interval(),
            shutdown_rx.clone(),
        )),
        _ => None,
    };

    let health_state = HealthState {
        store: format!("{:?}", worker_config.store_kind()?),
        mood_polling,
    };

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/alerts
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://care.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let api_routes = Router::new()
        .merge(dashboard::routes(dashboard::AppState {
            session: session_handle.clone(),
            video_feed_url,
        }))
        .merge(alerts::routes(alerts::AppState::new(alert_log.clone())))
        .merge(events::routes(events::AppState {
            session: session_handle,
            shutdown: shutdown_rx,
        }));

    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, &api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ]),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("Server error")?;

    session_task
        .await
        .context("Monitor session task failed")??;
    sync_task.await.ok();
    if let Some(demo_task) = demo_task {
        demo_task.await.ok();
    }

    tracing::info!("API shutdown complete");
    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
