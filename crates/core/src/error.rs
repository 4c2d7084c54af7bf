// Central Error Type for the Application

use crate::domain::TicketNumber;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// A non-terminal tracker already exists for this user; stop it first
    #[error("Tracker for user {user_key} already exists (tracking: {target})")]
    DuplicateTracker {
        user_key: String,
        target: TicketNumber,
    },

    /// Rejected settings (e.g. a zero poll interval)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
