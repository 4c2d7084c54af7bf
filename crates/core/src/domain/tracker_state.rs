// Tracker State Machine

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single tracker
///
/// `Idle -> Running -> Completed | Cancelled`, plus `Idle -> Cancelled` for a
/// tracker stopped before it was started. Terminal states never move again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl TrackerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TrackerState::Completed | TrackerState::Cancelled)
    }

    pub fn can_transition_to(self, to: TrackerState) -> bool {
        matches!(
            (self, to),
            (TrackerState::Idle, TrackerState::Running)
                | (TrackerState::Idle, TrackerState::Cancelled)
                | (TrackerState::Running, TrackerState::Completed)
                | (TrackerState::Running, TrackerState::Cancelled)
        )
    }

    /// Validate a transition and return the new state
    pub fn transition_to(self, to: TrackerState) -> Result<TrackerState> {
        if !self.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        Ok(to)
    }
}

impl std::fmt::Display for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerState::Idle => write!(f, "IDLE"),
            TrackerState::Running => write!(f, "RUNNING"),
            TrackerState::Completed => write!(f, "COMPLETED"),
            TrackerState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
