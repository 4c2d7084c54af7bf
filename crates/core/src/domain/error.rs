// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid tracker state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid target number: {0} (must be positive)")]
    InvalidTarget(i64),
}

pub type Result<T> = std::result::Result<T, DomainError>;
