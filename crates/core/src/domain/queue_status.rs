// Queue Status Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket number as issued by the queue
pub type TicketNumber = i64;

/// Rendered in place of a field the feed did not report as a number
pub const PLACEHOLDER: &str = "----";

/// Snapshot of the remote queue.
///
/// Both fields are optional because the feed sometimes publishes placeholder
/// text instead of a number. The constructor normalizes out-of-range values
/// to `None`, so anything reaching arithmetic is a real ticket number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    current_number: Option<TicketNumber>,
    waiting_count: Option<i64>,
}

impl QueueStatus {
    /// Build a status from raw feed values.
    ///
    /// A current number `<= 0` and a negative waiting count are treated as invalid.
    pub fn new(current_number: Option<TicketNumber>, waiting_count: Option<i64>) -> Self {
        Self {
            current_number: current_number.filter(|n| *n > 0),
            waiting_count: waiting_count.filter(|n| *n >= 0),
        }
    }

    /// Ticket currently being served, if the feed reported a valid one
    pub fn current_number(&self) -> Option<TicketNumber> {
        self.current_number
    }

    /// Number of groups still waiting, if reported
    pub fn waiting_count(&self) -> Option<i64> {
        self.waiting_count
    }

    pub fn has_valid_current_number(&self) -> bool {
        self.current_number.is_some()
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, value: Option<i64>) -> fmt::Result {
    match value {
        Some(n) => write!(f, "{}", n),
        None => f.write_str(PLACEHOLDER),
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("current: ")?;
        write_field(f, self.current_number)?;
        f.write_str(", waiting: ")?;
        write_field(f, self.waiting_count)
    }
}
