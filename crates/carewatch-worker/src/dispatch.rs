// Alert dispatcher
//
// Executes the actions decided by the AlertController:
// - Fire: append to the alert log, schedule a notification, broadcast the alert
// - StartAlarm / StopAlarm: drive the session's alarm slot
//
// Nothing here is fatal. Store and notifier failures are logged and swallowed
// so one broken collaborator never stops the session.

use std::sync::Arc;

use carewatch_core::{AlertAction, AlertFiring, AlertLog, DashboardState, MonitorEvent, Notifier};
use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::alarm::AlarmSlot;

pub struct AlertDispatcher {
    log: Arc<dyn AlertLog>,
    notifier: Arc<dyn Notifier>,
    alarm: AlarmSlot,
    events: broadcast::Sender<MonitorEvent>,
    dashboard: Arc<watch::Sender<DashboardState>>,
    notifications_enabled: bool,
}

impl AlertDispatcher {
    pub fn new(
        log: Arc<dyn AlertLog>,
        notifier: Arc<dyn Notifier>,
        alarm: AlarmSlot,
        events: broadcast::Sender<MonitorEvent>,
        dashboard: Arc<watch::Sender<DashboardState>>,
    ) -> Self {
        Self {
            log,
            notifier,
            alarm,
            events,
            dashboard,
            notifications_enabled: true,
        }
    }

    /// Stop scheduling notifications (permission was denied)
    pub fn disable_notifications(&mut self) {
        self.notifications_enabled = false;
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm.is_playing()
    }

    /// Execute actions in order
    pub async fn execute(&mut self, actions: Vec<AlertAction>) {
        for action in actions {
            match action {
                AlertAction::Fire(firing) => self.fire(firing).await,
                AlertAction::StartAlarm => self.start_alarm().await,
                AlertAction::StopAlarm => self.stop_alarm().await,
            }
        }
    }

    async fn fire(&self, firing: AlertFiring) {
        info!(kind = %firing.kind, message = %firing.message, "Alert fired");

        match self.log.append(firing.to_alert(Utc::now())).await {
            Ok(record) => debug!(alert_id = %record.id, "Alert recorded"),
            Err(e) => warn!(kind = %firing.kind, error = %e, "Failed to record alert"),
        }

        if self.notifications_enabled {
            if let Err(e) = self.notifier.schedule(firing.to_notification()).await {
                warn!(kind = %firing.kind, error = %e, "Failed to schedule notification");
            }
        }

        self.broadcast(MonitorEvent::AlertRaised {
            kind: firing.kind,
            title: firing.title,
            message: firing.message,
        });
    }

    async fn start_alarm(&mut self) {
        match self.alarm.start().await {
            Ok(true) => {
                self.dashboard.send_modify(|d| d.alarm_active = true);
                self.broadcast(MonitorEvent::AlarmStarted);
            }
            Ok(false) => debug!("Alarm already playing"),
            Err(e) => warn!(error = %e, "Failed to start alarm"),
        }
    }

    async fn stop_alarm(&mut self) {
        match self.alarm.stop().await {
            Ok(stopped) => {
                self.dashboard.send_modify(|d| d.alarm_active = false);
                if stopped {
                    self.broadcast(MonitorEvent::AlarmStopped);
                }
            }
            Err(e) => {
                // The slot is already empty; reflect that even though audio failed
                self.dashboard.send_modify(|d| d.alarm_active = false);
                warn!(error = %e, "Failed to stop alarm");
            }
        }
    }

    /// Silence the alarm on user request
    ///
    /// Only the sound stops; the controller's fall state is untouched, so the
    /// ongoing fall does not fire again. Returns false if nothing was playing.
    pub async fn acknowledge_alarm(&mut self) -> bool {
        if !self.alarm.is_playing() {
            debug!("Alarm acknowledged while silent");
            return false;
        }
        info!("Alarm acknowledged");
        self.stop_alarm().await;
        true
    }

    /// Release the alarm on session teardown
    pub async fn release(&mut self) {
        let was_playing = self.alarm.is_playing();
        self.alarm.release().await;
        if was_playing {
            self.dashboard.send_modify(|d| d.alarm_active = false);
            self.broadcast(MonitorEvent::AlarmStopped);
        }
    }

    fn broadcast(&self, event: MonitorEvent) {
        // No subscribers is fine: events are not stored
        let _ = self.events.send(event);
    }
}
