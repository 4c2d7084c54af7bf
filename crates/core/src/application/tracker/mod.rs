// Tracker - Per-user polling loop toward a target ticket

mod callbacks;
mod cancel;
pub mod constants;
mod panic_guard;

pub use callbacks::{TrackerCallbacks, TrackerEvent};
pub use cancel::CancellationToken;

use crate::domain::error::Result;
use crate::domain::{DomainError, Progress, QueueStatus, TicketNumber, TrackerState};
use crate::error::AppError;
use crate::port::{FetchError, QueueStatusProvider};
use constants::*;
use panic_guard::invoke_guarded;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Unique tracker instance ID
pub type TrackerId = String;

/// Polling cadence and fetch bounds for a tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Interval between ticks
    pub poll_interval: Duration,
    /// Interval used once the remaining gap drops below `near_threshold`
    pub near_poll_interval: Duration,
    pub near_threshold: i64,
    /// Timeout applied around every provider fetch
    pub fetch_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            near_poll_interval: NEAR_POLL_INTERVAL,
            near_threshold: NEAR_THRESHOLD,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    /// Reject settings that would make the loop spin or never switch cadence
    ///
    /// # Errors
    /// - AppError::Config naming the offending field
    pub fn validate(&self) -> crate::Result<()> {
        let zero_durations = [
            ("poll_interval", self.poll_interval),
            ("near_poll_interval", self.near_poll_interval),
            ("fetch_timeout", self.fetch_timeout),
        ];
        for (field, value) in zero_durations {
            if value.is_zero() {
                return Err(AppError::Config(format!("{} must be greater than zero", field)));
            }
        }
        if self.near_threshold < 1 {
            return Err(AppError::Config(format!(
                "near_threshold must be at least 1, got {}",
                self.near_threshold
            )));
        }
        Ok(())
    }
}

/// What a tick decided
enum Tick {
    Continue,
    Reached,
}

/// Loop-local state carried between ticks
struct PollState {
    interval: Duration,
    last_current: Option<TicketNumber>,
}

/// Tracks one user's target number until it is reached or the tracker is stopped.
///
/// Created `Idle`, moved to `Running` by [`Tracker::start`], and ends in exactly
/// one terminal state. `on_stop` fires on every exit from `Running`.
pub struct Tracker {
    id: TrackerId,
    user_key: String,
    target: TicketNumber,
    state: Mutex<TrackerState>,
    cancel: CancellationToken,
    callbacks: TrackerCallbacks,
    provider: Arc<dyn QueueStatusProvider>,
    config: TrackerConfig,
}

impl Tracker {
    /// Create an idle tracker
    ///
    /// # Errors
    /// - DomainError::InvalidTarget if `target` is not positive
    pub fn new(
        id: impl Into<TrackerId>,
        user_key: impl Into<String>,
        target: TicketNumber,
        provider: Arc<dyn QueueStatusProvider>,
        config: TrackerConfig,
        callbacks: TrackerCallbacks,
    ) -> Result<Self> {
        if target <= 0 {
            return Err(DomainError::InvalidTarget(target));
        }

        Ok(Self {
            id: id.into(),
            user_key: user_key.into(),
            target,
            state: Mutex::new(TrackerState::Idle),
            cancel: CancellationToken::new(),
            callbacks,
            provider,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn target_number(&self) -> TicketNumber {
        self.target
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Move to `Running`, fire `on_start` and spawn the polling loop.
    ///
    /// The first status check runs immediately; later ones follow the poll interval.
    ///
    /// # Errors
    /// - DomainError::InvalidStateTransition if the tracker was already started or stopped
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        self.transition(TrackerState::Running)?;

        info!(
            tracker_id = %self.id,
            user_key = %self.user_key,
            target = self.target,
            "Tracker started"
        );
        invoke_guarded(&self.id, "on_start", || (self.callbacks.on_start)(self.target));

        let tracker = Arc::clone(self);
        Ok(tokio::spawn(async move { tracker.run().await }))
    }

    /// Request cancellation.
    ///
    /// Idempotent and non-blocking. A running tracker stops at the next loop
    /// boundary; an in-flight fetch finishes but its result is discarded.
    /// A tracker that was never started moves straight to `Cancelled`
    /// without any callback, and can no longer be started.
    pub fn stop(&self) {
        self.request_stop();
    }

    /// Same as [`Tracker::stop`], returning the state observed before the request
    pub(crate) fn request_stop(&self) -> TrackerState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        match previous {
            TrackerState::Idle => {
                *state = TrackerState::Cancelled;
                drop(state);
                self.cancel.cancel();
                info!(
                    tracker_id = %self.id,
                    user_key = %self.user_key,
                    "Tracker cancelled before start"
                );
            }
            TrackerState::Running => {
                drop(state);
                self.cancel.cancel();
            }
            TrackerState::Completed | TrackerState::Cancelled => {
                debug!(tracker_id = %self.id, "Stop ignored: tracker already terminal");
            }
        }
        previous
    }

    async fn run(self: Arc<Self>) {
        let mut poll = PollState {
            interval: self.config.poll_interval,
            last_current: None,
        };
        let mut first_tick = true;

        let final_state = loop {
            if !first_tick {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {},
                    _ = sleep(poll.interval) => {},
                }
            }
            first_tick = false;

            if self.cancel.is_cancelled() {
                break TrackerState::Cancelled;
            }

            let fetched = self.fetch_status().await;

            if self.cancel.is_cancelled() {
                debug!(tracker_id = %self.id, "Discarding fetch result after stop request");
                break TrackerState::Cancelled;
            }

            if let Tick::Reached = self.handle_fetch(fetched, &mut poll) {
                break TrackerState::Completed;
            }
        };

        self.finish(final_state);
    }

    async fn fetch_status(&self) -> std::result::Result<QueueStatus, FetchError> {
        match timeout(self.config.fetch_timeout, self.provider.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(duration_millis(self.config.fetch_timeout))),
        }
    }

    fn handle_fetch(
        &self,
        fetched: std::result::Result<QueueStatus, FetchError>,
        poll: &mut PollState,
    ) -> Tick {
        let status = match fetched {
            Ok(status) => status,
            Err(e) => {
                warn!(tracker_id = %self.id, error = %e, "Queue status fetch failed");
                invoke_guarded(&self.id, "on_fetch_error", || (self.callbacks.on_fetch_error)(&e));
                return Tick::Continue;
            }
        };

        match Progress::evaluate(self.target, &status) {
            Progress::InvalidNumber => {
                debug!(tracker_id = %self.id, %status, "Feed returned no valid current number");
                invoke_guarded(&self.id, "on_invalid_number", || {
                    (self.callbacks.on_invalid_number)()
                });
                Tick::Continue
            }
            Progress::Reached { current } => {
                info!(
                    tracker_id = %self.id,
                    target = self.target,
                    current,
                    "Target number reached"
                );
                invoke_guarded(&self.id, "on_complete", || (self.callbacks.on_complete)());
                Tick::Reached
            }
            Progress::Waiting { current, remaining } => {
                if poll.last_current == Some(current) {
                    debug!(tracker_id = %self.id, current, "Queue stalled, update skipped");
                } else {
                    poll.last_current = Some(current);
                    invoke_guarded(&self.id, "on_update", || {
                        (self.callbacks.on_update)(current, remaining)
                    });
                }

                // Interval only ever shrinks
                if remaining < self.config.near_threshold
                    && self.config.near_poll_interval < poll.interval
                {
                    poll.interval = self.config.near_poll_interval;
                    info!(
                        tracker_id = %self.id,
                        remaining,
                        interval_secs = poll.interval.as_secs(),
                        "Target is close, polling faster"
                    );
                }
                Tick::Continue
            }
        }
    }

    fn finish(&self, to: TrackerState) {
        if let Err(e) = self.transition(to) {
            warn!(tracker_id = %self.id, error = %e, "Unexpected tracker transition");
        }
        info!(
            tracker_id = %self.id,
            user_key = %self.user_key,
            state = %to,
            "Tracker stopped"
        );
        invoke_guarded(&self.id, "on_stop", || (self.callbacks.on_stop)(self));
    }

    fn transition(&self, to: TrackerState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = state.transition_to(to)?;
        Ok(())
    }
}

/// Milliseconds in `d`, saturating at `u64::MAX`
fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("id", &self.id)
            .field("user_key", &self.user_key)
            .field("target", &self.target)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::queue_status_provider::mocks::MockQueueStatusProvider;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::Instant;

    fn tracker_with(
        provider: Arc<MockQueueStatusProvider>,
        target: TicketNumber,
    ) -> (Arc<Tracker>, UnboundedReceiver<TrackerEvent>) {
        let (callbacks, rx) = TrackerCallbacks::channel();
        let tracker = Tracker::new(
            "tracker-test",
            "user-1",
            target,
            provider,
            TrackerConfig::default(),
            callbacks,
        )
        .unwrap();
        (Arc::new(tracker), rx)
    }

    #[test]
    fn test_rejects_non_positive_target() {
        let provider = Arc::new(MockQueueStatusProvider::serving(1));
        let err = Tracker::new(
            "t",
            "u",
            0,
            provider,
            TrackerConfig::default(),
            TrackerCallbacks::new(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::InvalidTarget(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_passed_completes() {
        let provider = Arc::new(MockQueueStatusProvider::serving(105));
        let (tracker, mut rx) = tracker_with(provider.clone(), 100);
        assert_eq!(tracker.state(), TrackerState::Idle);

        let handle = tracker.start().unwrap();
        handle.await.unwrap();

        assert_eq!(rx.recv().await, Some(TrackerEvent::Started { target: 100 }));
        assert_eq!(rx.recv().await, Some(TrackerEvent::Completed));
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Stopped {
                target: 100,
                state: TrackerState::Completed
            })
        );
        assert_eq!(tracker.state(), TrackerState::Completed);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_is_immediate() {
        let provider = Arc::new(MockQueueStatusProvider::serving(95));
        let (tracker, mut rx) = tracker_with(provider, 100);
        let started_at = Instant::now();

        tracker.start().unwrap();
        rx.recv().await.unwrap(); // Started
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Updated {
                current: 95,
                remaining: 5
            })
        );
        assert_eq!(started_at.elapsed(), Duration::ZERO);
        assert_eq!(tracker.state(), TrackerState::Running);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_current_number_is_not_reported_twice() {
        let provider = Arc::new(MockQueueStatusProvider::serving_sequence(&[
            Some(90),
            Some(90),
            Some(92),
        ]));
        let (tracker, mut rx) = tracker_with(provider.clone(), 100);

        tracker.start().unwrap();
        rx.recv().await.unwrap(); // Started
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Updated {
                current: 90,
                remaining: 10
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Updated {
                current: 92,
                remaining: 8
            })
        );
        assert_eq!(provider.call_count(), 3);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_target_shrinks_interval() {
        let provider = Arc::new(MockQueueStatusProvider::serving_sequence(&[
            Some(90),
            Some(98),
            Some(99),
            Some(100),
        ]));
        let (tracker, mut rx) = tracker_with(provider, 100);
        let started_at = Instant::now();

        tracker.start().unwrap();
        rx.recv().await.unwrap(); // Started
        rx.recv().await.unwrap(); // 90 at t=0

        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Updated {
                current: 98,
                remaining: 2
            })
        );
        assert_eq!(started_at.elapsed(), Duration::from_secs(60));

        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Updated {
                current: 99,
                remaining: 1
            })
        );
        assert_eq!(started_at.elapsed(), Duration::from_secs(90));

        assert_eq!(rx.recv().await, Some(TrackerEvent::Completed));
        assert_eq!(started_at.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_are_not_fatal() {
        let provider = Arc::new(MockQueueStatusProvider::new(vec![
            Err(FetchError::Status(502)),
            Ok(QueueStatus::new(None, Some(3))),
            Ok(QueueStatus::new(Some(100), Some(0))),
        ]));
        let (tracker, mut rx) = tracker_with(provider, 100);

        tracker.start().unwrap().await.unwrap();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                TrackerEvent::Started { target: 100 },
                TrackerEvent::FetchFailed(FetchError::Status(502)),
                TrackerEvent::InvalidNumber,
                TrackerEvent::Completed,
                TrackerEvent::Stopped {
                    target: 100,
                    state: TrackerState::Completed
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        let provider = Arc::new(
            MockQueueStatusProvider::serving(50).with_delay(Duration::from_secs(10)),
        );
        let (tracker, mut rx) = tracker_with(provider, 100);

        tracker.start().unwrap();
        rx.recv().await.unwrap(); // Started
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::FetchFailed(FetchError::Timeout(2000)))
        );
        assert_eq!(tracker.state(), TrackerState::Running);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_fires_on_stop_once() {
        let provider = Arc::new(MockQueueStatusProvider::serving(10));
        let (tracker, mut rx) = tracker_with(provider, 100);

        let handle = tracker.start().unwrap();
        rx.recv().await.unwrap(); // Started
        rx.recv().await.unwrap(); // Updated

        tracker.stop();
        tracker.stop();
        handle.await.unwrap();
        tracker.stop();

        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Stopped {
                target: 100,
                state: TrackerState::Cancelled
            })
        );
        assert_eq!(tracker.state(), TrackerState::Cancelled);
        drop(tracker);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_after_stop() {
        let provider = Arc::new(
            MockQueueStatusProvider::serving(100).with_delay(Duration::from_millis(1500)),
        );
        let (tracker, mut rx) = tracker_with(provider.clone(), 100);

        let handle = tracker.start().unwrap();
        sleep(Duration::from_millis(500)).await;
        tracker.stop();
        handle.await.unwrap();

        assert_eq!(rx.recv().await, Some(TrackerEvent::Started { target: 100 }));
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Stopped {
                target: 100,
                state: TrackerState::Cancelled
            })
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(tracker.state(), TrackerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_cancels_idle_tracker() {
        let provider = Arc::new(MockQueueStatusProvider::serving(10));
        let (tracker, mut rx) = tracker_with(provider.clone(), 100);

        tracker.stop();
        assert_eq!(tracker.state(), TrackerState::Cancelled);
        assert!(tracker.is_terminal());

        let err = tracker.start().unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

        // Never ran: no on_start, no on_stop, no fetch
        assert!(rx.try_recv().is_err());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_update_does_not_kill_tracker() {
        let provider = Arc::new(MockQueueStatusProvider::serving_sequence(&[
            Some(90),
            Some(95),
            Some(100),
        ]));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let callbacks = TrackerCallbacks::forwarding(tx).on_update(|current, _| {
            panic!("render failed for {}", current);
        });
        let tracker = Arc::new(
            Tracker::new(
                "tracker-test",
                "user-1",
                100,
                provider.clone(),
                TrackerConfig::default(),
                callbacks,
            )
            .unwrap(),
        );

        tracker.start().unwrap().await.unwrap();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                TrackerEvent::Started { target: 100 },
                TrackerEvent::Completed,
                TrackerEvent::Stopped {
                    target: 100,
                    state: TrackerState::Completed
                },
            ]
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_complete_still_fires_on_stop() {
        let provider = Arc::new(MockQueueStatusProvider::serving(120));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let callbacks = TrackerCallbacks::forwarding(tx).on_complete(|| panic!("notify failed"));
        let tracker = Arc::new(
            Tracker::new(
                "tracker-test",
                "user-1",
                100,
                provider,
                TrackerConfig::default(),
                callbacks,
            )
            .unwrap(),
        );

        tracker.start().unwrap().await.unwrap();

        assert_eq!(rx.recv().await, Some(TrackerEvent::Started { target: 100 }));
        assert_eq!(
            rx.recv().await,
            Some(TrackerEvent::Stopped {
                target: 100,
                state: TrackerState::Completed
            })
        );
        assert_eq!(tracker.state(), TrackerState::Completed);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());

        let zero_poll = TrackerConfig {
            poll_interval: Duration::ZERO,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            zero_poll.validate(),
            Err(AppError::Config(msg)) if msg.contains("poll_interval")
        ));

        let zero_timeout = TrackerConfig {
            fetch_timeout: Duration::ZERO,
            ..TrackerConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let no_threshold = TrackerConfig {
            near_threshold: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(no_threshold.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_secs(2)), 2000);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let provider = Arc::new(MockQueueStatusProvider::serving(10));
        let (tracker, _rx) = tracker_with(provider, 100);

        tracker.start().unwrap();
        let err = tracker.start().unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

        tracker.stop();
    }
}
