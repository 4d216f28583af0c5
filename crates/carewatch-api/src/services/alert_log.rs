// Alert log service
//
// Mirrors the store's `alerts/` subscription into an AlertLogPresenter so list
// requests are served from the latest complete snapshot. Before the first
// snapshot arrives a request falls back to a one-off list.

use std::sync::Arc;

use carewatch_core::{AlertFilter, AlertLog, AlertLogPresenter, AlertLogView, AlertRecord, Result};
use chrono::FixedOffset;
use futures::StreamExt;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct AlertLogService {
    log: Arc<dyn AlertLog>,
    presenter: RwLock<AlertLogPresenter>,
}

impl AlertLogService {
    pub fn new(log: Arc<dyn AlertLog>, offset: FixedOffset) -> Self {
        Self {
            log,
            presenter: RwLock::new(AlertLogPresenter::new(offset)),
        }
    }

    pub fn apply_snapshot(&self, records: Vec<AlertRecord>) {
        let count = records.len();
        self.presenter.write().apply_snapshot(records);
        tracing::debug!(count, "Alert snapshot applied");
    }

    /// Grouped view under a filter
    pub async fn view(&self, filter: AlertFilter) -> Result<AlertLogView> {
        let loaded = self.presenter.read().is_loaded();
        if !loaded {
            let records = self.log.list().await?;
            self.apply_snapshot(records);
        }
        Ok(self.presenter.read().view(filter))
    }

    /// Remove every record, whatever filter the caller is looking at
    pub async fn clear(&self) -> Result<()> {
        self.log.clear().await?;
        self.presenter.write().clear();
        tracing::info!("Alert log cleared");
        Ok(())
    }

    /// Follow the store subscription until shutdown or until it ends
    pub fn spawn_sync(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut snapshots = match service.log.subscribe_alerts().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to subscribe to alerts");
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::info!("Alert sync shutting down");
                        break;
                    }
                    snapshot = snapshots.next() => match snapshot {
                        Some(Ok(records)) => service.apply_snapshot(records),
                        Some(Err(e)) => tracing::warn!(error = %e, "Alert subscription error"),
                        None => {
                            tracing::warn!("Alert subscription ended");
                            break;
                        }
                    }
                }
            }
        })
    }
}
