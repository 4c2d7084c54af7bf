// Tracker notification callbacks

use super::Tracker;
use crate::domain::{TicketNumber, TrackerState};
use crate::port::FetchError;
use tokio::sync::mpsc;

type StartFn = Box<dyn Fn(TicketNumber) + Send + Sync>;
type StopFn = Box<dyn Fn(&Tracker) + Send + Sync>;
type FetchErrorFn = Box<dyn Fn(&FetchError) + Send + Sync>;
type InvalidNumberFn = Box<dyn Fn() + Send + Sync>;
type UpdateFn = Box<dyn Fn(TicketNumber, i64) + Send + Sync>;
type CompleteFn = Box<dyn Fn() + Send + Sync>;

/// One tracker notification, as delivered by [`TrackerCallbacks::channel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Started {
        target: TicketNumber,
    },
    Stopped {
        target: TicketNumber,
        state: TrackerState,
    },
    FetchFailed(FetchError),
    InvalidNumber,
    Updated {
        current: TicketNumber,
        remaining: i64,
    },
    Completed,
}

/// Handlers invoked by a tracker over its lifetime.
///
/// Every handler defaults to a no-op; set the ones you care about:
///
/// ```text
/// let callbacks = TrackerCallbacks::new()
///     .on_update(|current, remaining| println!("{current}: {remaining} to go"))
///     .on_complete(|| println!("your turn"));
/// ```
pub struct TrackerCallbacks {
    pub(crate) on_start: StartFn,
    pub(crate) on_stop: StopFn,
    pub(crate) on_fetch_error: FetchErrorFn,
    pub(crate) on_invalid_number: InvalidNumberFn,
    pub(crate) on_update: UpdateFn,
    pub(crate) on_complete: CompleteFn,
}

impl TrackerCallbacks {
    pub fn new() -> Self {
        Self {
            on_start: Box::new(|_| {}),
            on_stop: Box::new(|_| {}),
            on_fetch_error: Box::new(|_| {}),
            on_invalid_number: Box::new(|| {}),
            on_update: Box::new(|_, _| {}),
            on_complete: Box::new(|| {}),
        }
    }

    /// Callbacks that forward every notification into a channel.
    ///
    /// Handy for tests and for consumers that prefer a stream of events.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::forwarding(tx), rx)
    }

    /// Callbacks that forward every notification into `tx`.
    /// Send errors (receiver dropped) are ignored.
    pub fn forwarding(tx: mpsc::UnboundedSender<TrackerEvent>) -> Self {
        let start_tx = tx.clone();
        let stop_tx = tx.clone();
        let error_tx = tx.clone();
        let invalid_tx = tx.clone();
        let update_tx = tx.clone();
        let complete_tx = tx;

        Self::new()
            .on_start(move |target| {
                let _ = start_tx.send(TrackerEvent::Started { target });
            })
            .on_stop(move |tracker| {
                let _ = stop_tx.send(TrackerEvent::Stopped {
                    target: tracker.target_number(),
                    state: tracker.state(),
                });
            })
            .on_fetch_error(move |err| {
                let _ = error_tx.send(TrackerEvent::FetchFailed(err.clone()));
            })
            .on_invalid_number(move || {
                let _ = invalid_tx.send(TrackerEvent::InvalidNumber);
            })
            .on_update(move |current, remaining| {
                let _ = update_tx.send(TrackerEvent::Updated { current, remaining });
            })
            .on_complete(move || {
                let _ = complete_tx.send(TrackerEvent::Completed);
            })
    }

    pub fn on_start(mut self, f: impl Fn(TicketNumber) + Send + Sync + 'static) -> Self {
        self.on_start = Box::new(f);
        self
    }

    /// Called on every exit from `Running`, after the tracker reached its
    /// terminal state. The place to release the tracker from its registry.
    pub fn on_stop(mut self, f: impl Fn(&Tracker) + Send + Sync + 'static) -> Self {
        self.on_stop = Box::new(f);
        self
    }

    pub fn on_fetch_error(mut self, f: impl Fn(&FetchError) + Send + Sync + 'static) -> Self {
        self.on_fetch_error = Box::new(f);
        self
    }

    pub fn on_invalid_number(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_invalid_number = Box::new(f);
        self
    }

    /// Called with `(current, remaining)` while the target is still ahead
    pub fn on_update(mut self, f: impl Fn(TicketNumber, i64) + Send + Sync + 'static) -> Self {
        self.on_update = Box::new(f);
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Box::new(f);
        self
    }
}

impl Default for TrackerCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrackerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerCallbacks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_forwards_in_order() {
        let (callbacks, mut rx) = TrackerCallbacks::channel();

        (callbacks.on_start)(100);
        (callbacks.on_update)(95, 5);
        (callbacks.on_invalid_number)();
        (callbacks.on_fetch_error)(&FetchError::Status(503));
        (callbacks.on_complete)();

        assert_eq!(rx.try_recv().unwrap(), TrackerEvent::Started { target: 100 });
        assert_eq!(
            rx.try_recv().unwrap(),
            TrackerEvent::Updated {
                current: 95,
                remaining: 5
            }
        );
        assert_eq!(rx.try_recv().unwrap(), TrackerEvent::InvalidNumber);
        assert_eq!(
            rx.try_recv().unwrap(),
            TrackerEvent::FetchFailed(FetchError::Status(503))
        );
        assert_eq!(rx.try_recv().unwrap(), TrackerEvent::Completed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_forwarding_ignores_dropped_receiver() {
        let (callbacks, rx) = TrackerCallbacks::channel();
        drop(rx);
        (callbacks.on_complete)();
    }
}
