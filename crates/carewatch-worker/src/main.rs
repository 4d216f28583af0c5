use std::sync::Arc;

use anyhow::{Context, Result};
use carewatch_core::MoodSource;
use carewatch_worker::{
    create_mood_source, create_store_backends, spawn_demo_feed, MonitorSession, SessionDeps,
    TracingAudio, TracingNotifier, WorkerConfig,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carewatch_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("carewatch-worker starting...");

    let config = WorkerConfig::from_env();
    let monitor_config = config
        .monitor_config()
        .context("Invalid monitor configuration")?;
    tracing::info!(
        temperature_policy = ?monitor_config.temperature_policy,
        cooldown_ms = monitor_config.alert_cooldown_ms,
        low_c = monitor_config.thresholds.temperature_low_c,
        high_c = monitor_config.thresholds.temperature_high_c,
        "Monitor configured"
    );

    let stores = create_store_backends(&config)?;
    let demo_readings = config
        .demo_readings()
        .context("Invalid CAREWATCH_DEMO_READINGS")?;
    let mood = create_mood_source(&config)?
        .map(|source| (Arc::new(source) as Arc<dyn MoodSource>, config.mood_poll_interval()));

    let session = MonitorSession::new(
        &monitor_config,
        SessionDeps {
            readings: stores.readings,
            alerts: stores.alerts,
            mood,
            notifier: Arc::new(TracingNotifier::new()),
            audio: Arc::new(TracingAudio::new()),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx.clone()));
    let demo_task = match stores.memory {
        Some(store) if !demo_readings.is_empty() => Some(spawn_demo_feed(
            store,
            demo_readings,
            config.demo_interval(),
            shutdown_rx,
        )),
        _ => None,
    };

    tracing::info!("Worker ready, waiting for shutdown signal...");
    tokio::signal::ctrl_c().await?;

    let _ = shutdown_tx.send(true);
    task.await.context("Monitor session task failed")??;
    if let Some(demo_task) = demo_task {
        let _ = demo_task.await;
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}
