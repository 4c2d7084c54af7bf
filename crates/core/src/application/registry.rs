//! Tracker Registry - one live tracker per user
//!
//! All lookups and mutations go through a single mutex so `create`, `get`
//! and `remove` are linearizable. The lock is never held across an await,
//! and never while a tracker fetches.

use crate::application::tracker::{Tracker, TrackerCallbacks, TrackerConfig};
use crate::domain::{TicketNumber, TrackerState};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, QueueStatusProvider, UuidProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Opaque user identity (e.g. a chat user ID)
pub type UserKey = String;

/// Registry of active trackers, keyed by user
pub struct TrackerRegistry {
    trackers: Mutex<HashMap<UserKey, Arc<Tracker>>>,
    provider: Arc<dyn QueueStatusProvider>,
    id_provider: Arc<dyn IdProvider>,
    config: TrackerConfig,
}

impl TrackerRegistry {
    /// Create a registry whose trackers poll `provider` with `config`
    pub fn new(provider: Arc<dyn QueueStatusProvider>, config: TrackerConfig) -> Self {
        Self::with_id_provider(provider, config, Arc::new(UuidProvider))
    }

    pub fn with_id_provider(
        provider: Arc<dyn QueueStatusProvider>,
        config: TrackerConfig,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            trackers: Mutex::new(HashMap::new()),
            provider,
            id_provider,
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserKey, Arc<Tracker>>> {
        self.trackers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and register an idle tracker for `user_key`.
    ///
    /// A terminal tracker still sitting in the map (its `on_stop` has not
    /// cleaned up yet) is replaced.
    ///
    /// # Errors
    /// - AppError::DuplicateTracker if a non-terminal tracker exists for the user
    /// - AppError::Domain if `target` is not a valid ticket number
    pub fn create(
        &self,
        user_key: impl Into<UserKey>,
        target: TicketNumber,
        callbacks: TrackerCallbacks,
    ) -> Result<Arc<Tracker>> {
        let user_key = user_key.into();
        let mut trackers = self.lock();

        if let Some(existing) = trackers.get(&user_key) {
            if !existing.is_terminal() {
                return Err(AppError::DuplicateTracker {
                    user_key,
                    target: existing.target_number(),
                });
            }
            debug!(user_key = %user_key, "Replacing terminal tracker");
        }

        let tracker = Arc::new(Tracker::new(
            self.id_provider.generate_id(),
            user_key.clone(),
            target,
            Arc::clone(&self.provider),
            self.config.clone(),
            callbacks,
        )?);
        trackers.insert(user_key.clone(), Arc::clone(&tracker));

        info!(
            user_key = %user_key,
            tracker_id = %tracker.id(),
            target,
            "Tracker registered"
        );
        Ok(tracker)
    }

    pub fn get(&self, user_key: &str) -> Option<Arc<Tracker>> {
        self.lock().get(user_key).cloned()
    }

    /// Remove the user's entry. Removing an absent key is a no-op.
    pub fn remove(&self, user_key: &str) -> Option<Arc<Tracker>> {
        let removed = self.lock().remove(user_key);
        if removed.is_some() {
            debug!(user_key = %user_key, "Tracker removed");
        }
        removed
    }

    /// Remove `tracker`'s entry only if the map still points at that instance.
    ///
    /// Intended for `on_stop` handlers: a late cleanup can never evict a
    /// successor created for the same user.
    pub fn release(&self, tracker: &Tracker) -> bool {
        let mut trackers = self.lock();
        match trackers.get(tracker.user_key()) {
            Some(current) if current.id() == tracker.id() => {
                trackers.remove(tracker.user_key());
                debug!(user_key = %tracker.user_key(), tracker_id = %tracker.id(), "Tracker released");
                true
            }
            _ => false,
        }
    }

    /// Stop the user's tracker, if any. Returns false when there was none.
    ///
    /// A tracker that was never started has no `on_stop` to clean up after
    /// it, so its entry is released here.
    pub fn stop(&self, user_key: &str) -> bool {
        // Lookup under the lock, signal outside it
        match self.get(user_key) {
            Some(tracker) => {
                if tracker.request_stop() == TrackerState::Idle {
                    self.release(&tracker);
                }
                true
            }
            None => false,
        }
    }

    /// Signal every registered tracker to stop
    pub fn stop_all(&self) -> usize {
        let trackers: Vec<_> = self.lock().values().cloned().collect();
        for tracker in &trackers {
            if tracker.request_stop() == TrackerState::Idle {
                self.release(tracker);
            }
        }
        trackers.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Users that currently have an entry, sorted
    pub fn active_users(&self) -> Vec<UserKey> {
        let mut users: Vec<_> = self.lock().keys().cloned().collect();
        users.sort();
        users
    }
}
