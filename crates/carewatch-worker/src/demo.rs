// Demo sensor feed
//
// Without a sensor hub the in-memory store stays empty and the dashboard sits
// on "no data". This task plays a fixed list of readings into the store in a
// loop so a local run shows live values, alerts and the fall alarm.

use std::time::Duration;

use carewatch_core::memory::InMemoryStore;
use carewatch_core::{MonitorError, Reading, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Parse `temp:humidity:fall` entries separated by commas
///
/// `fall` accepts `true`/`false` or `1`/`0`, e.g. `22.5:45:false,41:50:0,22:45:1`.
pub fn parse_demo_readings(raw: &str) -> Result<Vec<Reading>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(entry: &str) -> Result<Reading> {
    let invalid = || MonitorError::config(format!("Invalid demo reading: {}", entry));

    let mut parts = entry.split(':').map(str::trim);
    let (Some(temp), Some(humidity), Some(fall), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let temperature = temp.parse::<f64>().map_err(|_| invalid())?;
    let humidity = humidity.parse::<f64>().map_err(|_| invalid())?;
    let fall_detected = match fall.to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => return Err(invalid()),
    };
    Ok(Reading::new(temperature, humidity, fall_detected))
}

/// Publish `readings` into `store` one per `period`, cycling until shutdown
pub fn spawn_demo_feed(
    store: InMemoryStore,
    readings: Vec<Reading>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if readings.is_empty() {
            return;
        }
        tracing::info!(count = readings.len(), ?period, "Demo sensor feed started");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next = readings.iter().cycle();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Demo sensor feed shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(reading) = next.next() {
                        tracing::debug!(?reading, "Demo reading published");
                        store.set_reading(*reading);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewatch_core::ReadingSource;
    use futures::StreamExt;

    #[test]
    fn test_parse_demo_readings() {
        let readings = parse_demo_readings(" 22.5:45:false, 41:50:0 ,22:45:1,").unwrap();
        assert_eq!(
            readings,
            vec![
                Reading::new(22.5, 45.0, false),
                Reading::new(41.0, 50.0, false),
                Reading::new(22.0, 45.0, true),
            ]
        );
        assert!(parse_demo_readings("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_demo_readings_rejects_malformed_entries() {
        for raw in ["22:45", "22:45:false:1", "warm:45:false", "22:45:maybe"] {
            assert!(
                matches!(parse_demo_readings(raw), Err(MonitorError::Configuration(_))),
                "{raw}"
            );
        }
    }

    #[tokio::test]
    async fn test_demo_feed_cycles_until_shutdown() {
        let store = InMemoryStore::new();
        let mut stream = store.subscribe_readings().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        let readings = vec![Reading::new(20.0, 40.0, false), Reading::new(41.0, 40.0, true)];
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = spawn_demo_feed(
            store.clone(),
            readings.clone(),
            Duration::from_millis(5),
            shutdown_rx,
        );

        let mut seen = Vec::new();
        while seen.len() < 3 {
            if let Some(reading) = stream.next().await.unwrap().unwrap() {
                seen.push(reading);
            }
        }
        assert_eq!(seen, vec![readings[0], readings[1], readings[0]]);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
