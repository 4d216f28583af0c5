// Mood poller
//
// Polls a MoodSource on a fixed interval. Each tick replaces the outstanding
// request, so results are always delivered in issue order. Dropping the poller
// cancels the in-flight request and all future ticks.
//
// `next_mood` is cancel-safe: the ticker and the in-flight request live in the
// poller, so a caller can use it as one branch of a `select!` loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use carewatch_core::{Mood, MoodSample, MoodSource, Result};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

type MoodRequest = Pin<Box<dyn Future<Output = Result<MoodSample>> + Send>>;

pub struct MoodPoller {
    source: Arc<dyn MoodSource>,
    ticker: Interval,
    in_flight: Option<MoodRequest>,
    last: Option<Mood>,
    failures: u64,
}

impl MoodPoller {
    pub fn new(source: Arc<dyn MoodSource>, period: Duration) -> Self {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            source,
            ticker,
            in_flight: None,
            last: None,
            failures: 0,
        }
    }

    /// Last successfully polled mood
    pub fn last(&self) -> Option<Mood> {
        self.last
    }

    /// Number of failed polls so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Wait for the next successful poll
    ///
    /// Failed polls are logged and skipped; the last mood stays in effect.
    pub async fn next_mood(&mut self) -> Mood {
        loop {
            tokio::select! {
                _ = self.ticker.tick() => {
                    if self.in_flight.is_some() {
                        debug!("Cancelling outstanding mood request");
                    }
                    let source = self.source.clone();
                    self.in_flight = Some(Box::pin(async move { source.fetch_mood().await }));
                }
                result = poll_request(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    match result {
                        Ok(sample) => {
                            self.last = Some(sample.mood);
                            return sample.mood;
                        }
                        Err(e) => {
                            self.failures += 1;
                            warn!(error = %e, last = ?self.last, "Mood poll failed");
                        }
                    }
                }
            }
        }
    }
}

async fn poll_request(request: &mut Option<MoodRequest>) -> Result<MoodSample> {
    match request {
        Some(request) => request.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carewatch_core::memory::ScriptedMoodSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// First request hangs past the next tick, later ones answer at once
    struct SlowFirstSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MoodSource for SlowFirstSource {
        async fn fetch_mood(&self) -> Result<MoodSample> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
                return Ok(MoodSample::new(Mood::Angry));
            }
            Ok(MoodSample::new(Mood::Sad))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_tick_cancels_outstanding_request() {
        let source = Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(0),
        });
        let mut poller = MoodPoller::new(source.clone(), Duration::from_secs(2));

        assert_eq!(poller.next_mood().await, Mood::Sad);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.last(), Some(Mood::Sad));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_last_mood() {
        let source = Arc::new(ScriptedMoodSource::new([
            Ok(MoodSample::new(Mood::Happy)),
            Err("connection refused".to_string()),
            Err("connection refused".to_string()),
            Ok(MoodSample::new(Mood::Fear)),
        ]));
        let mut poller = MoodPoller::new(source, Duration::from_millis(2000));

        assert_eq!(poller.next_mood().await, Mood::Happy);
        assert_eq!(poller.next_mood().await, Mood::Fear);
        assert_eq!(poller.failures(), 2);
    }
}
