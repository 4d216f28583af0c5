// Monitor session
// Decision: One task owns the controller and processes readings and mood results
// sequentially in a single select! loop, so controller updates never interleave
//
// The session:
// 1. Requests notification permission once (a denial is broadcast once)
// 2. Subscribes to `house/` readings and polls the mood service
// 3. Feeds both into the AlertController and executes the resulting actions
// 4. Publishes dashboard state on a watch channel and alerts on a broadcast channel
// 5. Applies client commands (alarm acknowledgement) in the same loop
// 6. Releases the alarm on shutdown

use std::sync::Arc;
use std::time::Duration;

use carewatch_core::{
    AlertController, AlertLog, AudioBackend, DashboardState, DashboardView, MonitorConfig,
    MonitorError, MonitorEvent, Mood, MoodSource, Notifier, PermissionStatus, Reading,
    ReadingSource, ReadingStream, Result, Thresholds,
};
use chrono::Utc;
use futures::{stream, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::alarm::AlarmSlot;
use crate::dispatch::AlertDispatcher;
use crate::mood_poller::MoodPoller;

/// Event channel capacity; slow subscribers lag instead of blocking the session
const EVENT_CHANNEL_CAPACITY: usize = 64;

const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Client request applied by the session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    AcknowledgeAlarm,
}

/// Collaborators of a monitor session
#[derive(Clone)]
pub struct SessionDeps {
    pub readings: Arc<dyn ReadingSource>,
    pub alerts: Arc<dyn AlertLog>,
    /// Mood source and poll interval; `None` disables mood polling
    pub mood: Option<(Arc<dyn MoodSource>, Duration)>,
    pub notifier: Arc<dyn Notifier>,
    pub audio: Arc<dyn AudioBackend>,
}

/// Cloneable view into a running session
#[derive(Clone)]
pub struct SessionHandle {
    dashboard: Arc<watch::Sender<DashboardState>>,
    events: broadcast::Sender<MonitorEvent>,
    commands: mpsc::Sender<SessionCommand>,
    thresholds: Thresholds,
}

impl SessionHandle {
    /// Current dashboard state
    pub fn dashboard(&self) -> DashboardState {
        self.dashboard.borrow().clone()
    }

    /// Current dashboard with derived indicators
    pub fn view(&self) -> DashboardView {
        self.dashboard.borrow().view(&self.thresholds)
    }

    pub fn watch_dashboard(&self) -> watch::Receiver<DashboardState> {
        self.dashboard.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Reset a `NoData` dashboard to `Connecting`
    ///
    /// Only the loading flag changes; the subscription is not reopened.
    pub fn retry(&self) -> DashboardState {
        self.dashboard.send_modify(|d| d.retry());
        self.dashboard()
    }

    /// Ask the session to silence the fall alarm
    ///
    /// The request is queued; `AlarmStopped` is broadcast once the session has
    /// stopped the sound. The fall itself stays active until the sensor clears.
    pub fn acknowledge_alarm(&self) -> Result<()> {
        match self.commands.try_send(SessionCommand::AcknowledgeAlarm) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Alarm acknowledgement already queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MonitorError::SessionStopped),
        }
    }
}

pub struct MonitorSession {
    controller: AlertController,
    dispatcher: AlertDispatcher,
    readings: Arc<dyn ReadingSource>,
    notifier: Arc<dyn Notifier>,
    mood: Option<(Arc<dyn MoodSource>, Duration)>,
    commands: mpsc::Receiver<SessionCommand>,
    handle: SessionHandle,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl MonitorSession {
    pub fn new(config: &MonitorConfig, deps: SessionDeps) -> Self {
        let (dashboard_tx, _) = watch::channel(DashboardState::default());
        let dashboard = Arc::new(dashboard_tx);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (commands_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let alarm = AlarmSlot::new(deps.audio, config.alarm_sound_asset.clone());
        let dispatcher = AlertDispatcher::new(
            deps.alerts,
            deps.notifier.clone(),
            alarm,
            events.clone(),
            dashboard.clone(),
        );

        Self {
            controller: AlertController::new(config),
            dispatcher,
            readings: deps.readings,
            notifier: deps.notifier,
            mood: deps.mood,
            commands,
            handle: SessionHandle {
                dashboard,
                events,
                commands: commands_tx,
                thresholds: config.thresholds.clone(),
            },
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Run until the shutdown signal flips (or its sender is dropped)
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            temperature_policy = ?self.controller.temperature_policy(),
            mood_polling = self.mood.is_some(),
            "Monitor session starting"
        );

        self.request_notification_permission().await;

        let mut poller = self
            .mood
            .take()
            .map(|(source, period)| MoodPoller::new(source, period));
        let mut readings = self.subscribe_readings().await;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping session");
                    break;
                }
                update = readings.next() => match update {
                    Some(Ok(Some(reading))) => self.handle_reading(reading).await,
                    Some(Ok(None)) => {
                        debug!("No reading under house/");
                        self.handle.dashboard.send_modify(|d| d.mark_no_data());
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Reading subscription error");
                        self.handle.dashboard.send_modify(|d| d.mark_no_data());
                    }
                    None => {
                        warn!("Reading subscription ended");
                        self.handle.dashboard.send_modify(|d| d.mark_no_data());
                        readings = Box::pin(stream::pending());
                    }
                },
                mood = next_mood(&mut poller) => self.handle_mood(mood).await,
                Some(command) = self.commands.recv() => self.handle_command(command).await,
            }
        }

        drop(readings);
        drop(poller);
        self.dispatcher.release().await;

        info!("Monitor session stopped");
        Ok(())
    }

    async fn request_notification_permission(&mut self) {
        match self.notifier.request_permission().await {
            Ok(PermissionStatus::Granted) => debug!("Notification permission granted"),
            Ok(PermissionStatus::Denied) => {
                warn!("Notification permission denied; alerts will not be notified");
                self.dispatcher.disable_notifications();
                let _ = self
                    .handle
                    .events
                    .send(MonitorEvent::NotificationPermissionDenied);
            }
            Err(e) => warn!(error = %e, "Failed to request notification permission"),
        }
    }

    async fn subscribe_readings(&self) -> ReadingStream {
        match self.readings.subscribe_readings().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Failed to subscribe to readings");
                self.handle.dashboard.send_modify(|d| d.mark_no_data());
                Box::pin(stream::pending())
            }
        }
    }

    async fn handle_reading(&mut self, reading: Reading) {
        debug!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            fall = reading.fall_detected,
            "Reading received"
        );
        self.handle.dashboard.send_modify(|d| d.apply_reading(reading));
        let actions = self.controller.on_reading(&reading, now_ms());
        self.dispatcher.execute(actions).await;
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::AcknowledgeAlarm => {
                self.dispatcher.acknowledge_alarm().await;
            }
        }
    }

    async fn handle_mood(&mut self, mood: Mood) {
        debug!(mood = %mood, "Mood received");
        self.handle.dashboard.send_modify(|d| d.mood = mood);
        let actions = self.controller.on_mood(mood, now_ms());
        self.dispatcher.execute(actions).await;
    }
}

async fn next_mood(poller: &mut Option<MoodPoller>) -> Mood {
    match poller {
        Some(poller) => poller.next_mood().await,
        None => std::future::pending().await,
    }
}
