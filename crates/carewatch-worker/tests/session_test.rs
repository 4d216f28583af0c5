// Integration tests for the monitor session using in-memory collaborators

use std::sync::Arc;
use std::time::Duration;

use carewatch_core::memory::{
    AudioCall, InMemoryStore, RecordingAudio, RecordingNotifier, ScriptedMoodSource,
};
use carewatch_core::{
    AlertKind, AlertPolicy, ConnectionState, MonitorConfig, MonitorError, MonitorEvent, Mood,
    MoodSample, MoodSource, PermissionStatus, Reading,
};
use carewatch_worker::{MonitorSession, SessionDeps, SessionHandle};
use tokio::sync::{broadcast, watch};

struct Harness {
    store: InMemoryStore,
    notifier: RecordingNotifier,
    audio: RecordingAudio,
}

impl Harness {
    fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self {
            store: InMemoryStore::new(),
            notifier,
            audio: RecordingAudio::new(),
        }
    }

    fn session(&self, mood: Option<Arc<dyn MoodSource>>) -> MonitorSession {
        self.session_with_config(&MonitorConfig::default(), mood)
    }

    fn session_with_config(
        &self,
        config: &MonitorConfig,
        mood: Option<Arc<dyn MoodSource>>,
    ) -> MonitorSession {
        MonitorSession::new(
            config,
            SessionDeps {
                readings: Arc::new(self.store.clone()),
                alerts: Arc::new(self.store.clone()),
                mood: mood.map(|source| (source, Duration::from_millis(2000))),
                notifier: Arc::new(self.notifier.clone()),
                audio: Arc::new(self.audio.clone()),
            },
        )
    }
}

async fn next_event(events: &mut broadcast::Receiver<MonitorEvent>) -> MonitorEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Wait until the session has received the empty `house/` record, i.e. it
/// is subscribed and every later publish reaches it
async fn wait_subscribed(handle: &SessionHandle) {
    let mut dashboard = handle.watch_dashboard();
    tokio::time::timeout(
        Duration::from_secs(5),
        dashboard.wait_for(|d| d.connection == ConnectionState::NoData),
    )
    .await
    .expect("session did not subscribe")
    .expect("dashboard channel closed");
}

#[tokio::test]
async fn test_fall_episode_fires_once_and_stops_alarm() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    h.store.set_reading(Reading::new(22.0, 45.0, true));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStarted);
    match next_event(&mut events).await {
        MonitorEvent::AlertRaised { kind, title, .. } => {
            assert_eq!(kind, AlertKind::Fall);
            assert_eq!(title, "Fall Detected!");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(handle.dashboard().alarm_active);

    // Still fallen on the next tick, then recovered
    h.store.set_reading(Reading::new(22.0, 45.0, true));
    h.store.set_reading(Reading::new(22.0, 45.0, false));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStopped);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(h.store.alert_count(), 1);
    assert_eq!(h.notifier.sent().len(), 1);
    assert_eq!(h.audio.play_count(), 1);
    assert_eq!(h.audio.loaded(), 0);
    assert!(!handle.dashboard().alarm_active);
}

#[tokio::test]
async fn test_shutdown_releases_playing_alarm() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    h.store.set_reading(Reading::new(22.0, 45.0, true));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStarted);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(h.audio.loaded(), 0);
    assert!(matches!(h.audio.calls().last(), Some(AudioCall::Unload(_))));
    assert!(!handle.dashboard().alarm_active);
}

#[tokio::test]
async fn test_permission_denied_is_reported_once() {
    let h = Harness::with_notifier(RecordingNotifier::with_permission(PermissionStatus::Denied));
    let session = h.session(None);
    let mut events = session.handle().subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    assert_eq!(
        next_event(&mut events).await,
        MonitorEvent::NotificationPermissionDenied
    );

    h.store.set_reading(Reading::new(45.0, 50.0, false));
    match next_event(&mut events).await {
        MonitorEvent::AlertRaised { kind, message, .. } => {
            assert_eq!(kind, AlertKind::Temperature);
            assert!(message.contains("45"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.store.alert_count(), 1);
}

#[tokio::test]
async fn test_store_write_failure_does_not_stop_session() {
    let h = Harness::new();
    h.store.set_fail_writes(true);
    let session = h.session(None);
    let mut events = session.handle().subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    h.store.set_reading(Reading::new(2.0, 30.0, false));
    match next_event(&mut events).await {
        MonitorEvent::AlertRaised { message, .. } => {
            assert!(message.ends_with("Low Temperature!"))
        }
        other => panic!("unexpected event: {other:?}"),
    }

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(h.store.alert_count(), 0);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_dashboard_connection_states() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let mut dashboard = handle.watch_dashboard();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    // Empty house/ record
    tokio::time::timeout(
        Duration::from_secs(5),
        dashboard.wait_for(|d| d.connection == ConnectionState::NoData),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(handle.retry().connection, ConnectionState::Connecting);

    h.store.set_reading(Reading::new(24.0, 50.0, false));
    tokio::time::timeout(
        Duration::from_secs(5),
        dashboard.wait_for(|d| d.connection == ConnectionState::Live),
    )
    .await
    .unwrap()
    .unwrap();

    let view = handle.view();
    assert_eq!(view.reading, Some(Reading::new(24.0, 50.0, false)));
    assert!(view.comfort.is_some());
    assert_eq!(view.humidity_gauge, Some(50.0));
    assert!(!view.distress);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_distressed_mood_raises_alert() {
    let h = Harness::new();
    let mood: Arc<dyn MoodSource> =
        Arc::new(ScriptedMoodSource::constant(MoodSample::new(Mood::Sad)));
    let session = h.session(Some(mood));
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    match next_event(&mut events).await {
        MonitorEvent::AlertRaised {
            kind,
            title,
            message,
        } => {
            assert_eq!(kind, AlertKind::Mood);
            assert_eq!(title, "Emotional Distress Detected");
            assert_eq!(message, "Person appears to be sad");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(handle.dashboard().mood, Mood::Sad);
    assert!(handle.view().distress);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(h.store.alert_count(), 1);
}

#[tokio::test]
async fn test_back_to_back_readings_are_each_evaluated() {
    let h = Harness::new();
    let config = MonitorConfig::default().with_temperature_policy(AlertPolicy::Level);
    let session = h.session_with_config(&config, None);
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));
    wait_subscribed(&handle).await;

    for temp in [41.0, 42.0, 43.0] {
        h.store.set_reading(Reading::new(temp, 50.0, false));
    }
    for expected in ["41", "42", "43"] {
        match next_event(&mut events).await {
            MonitorEvent::AlertRaised { kind, message, .. } => {
                assert_eq!(kind, AlertKind::Temperature);
                assert!(message.contains(expected), "{message}");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(h.store.alert_count(), 3);
}

#[tokio::test]
async fn test_brief_fall_is_not_lost() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));
    wait_subscribed(&handle).await;

    h.store.set_reading(Reading::new(22.0, 45.0, true));
    h.store.set_reading(Reading::new(22.0, 45.0, false));

    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStarted);
    assert!(matches!(
        next_event(&mut events).await,
        MonitorEvent::AlertRaised { kind: AlertKind::Fall, .. }
    ));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStopped);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(h.store.alert_count(), 1);
    assert_eq!(h.audio.loaded(), 0);
}

#[tokio::test]
async fn test_acknowledged_alarm_stays_silent_while_fall_persists() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let mut events = handle.subscribe_events();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));
    wait_subscribed(&handle).await;

    h.store.set_reading(Reading::new(22.0, 45.0, true));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStarted);
    assert!(matches!(
        next_event(&mut events).await,
        MonitorEvent::AlertRaised { kind: AlertKind::Fall, .. }
    ));

    handle.acknowledge_alarm().unwrap();
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStopped);
    assert!(!handle.dashboard().alarm_active);

    // Fall still reported: no new alert, no new alarm
    h.store.set_reading(Reading::new(22.5, 45.0, true));
    // Then a new episode after recovery
    h.store.set_reading(Reading::new(22.5, 45.0, false));
    h.store.set_reading(Reading::new(22.5, 45.0, true));
    assert_eq!(next_event(&mut events).await, MonitorEvent::AlarmStarted);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(h.store.alert_count(), 2);
    assert_eq!(h.audio.play_count(), 2);
}

#[tokio::test]
async fn test_acknowledge_after_shutdown_fails() {
    let h = Harness::new();
    let session = h.session(None);
    let handle = session.handle();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session.run(shutdown_rx));

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert!(matches!(handle.acknowledge_alarm(), Err(MonitorError::SessionStopped)));
}
