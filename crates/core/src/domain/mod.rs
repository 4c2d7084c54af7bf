// Domain Layer - Pure value types and state rules

pub mod error;
pub mod progress;
pub mod queue_status;
pub mod tracker_state;

// Re-exports
pub use error::DomainError;
pub use progress::Progress;
pub use queue_status::{QueueStatus, TicketNumber, PLACEHOLDER};
pub use tracker_state::TrackerState;
