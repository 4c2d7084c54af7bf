// Progress toward a target ticket

use super::queue_status::{QueueStatus, TicketNumber};

/// Outcome of comparing one queue snapshot with a target number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Feed did not report a usable current number
    InvalidNumber,
    /// Target not yet reached; `remaining` is always positive
    Waiting {
        current: TicketNumber,
        remaining: i64,
    },
    /// Current number is at or past the target
    Reached { current: TicketNumber },
}

impl Progress {
    pub fn evaluate(target: TicketNumber, status: &QueueStatus) -> Self {
        let Some(current) = status.current_number() else {
            return Progress::InvalidNumber;
        };

        let remaining = target - current;
        if remaining <= 0 {
            Progress::Reached { current }
        } else {
            Progress::Waiting { current, remaining }
        }
    }
}
