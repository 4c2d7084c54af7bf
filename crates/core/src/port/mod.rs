// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod queue_status_provider;

// Re-exports
pub use id_provider::{IdProvider, UuidProvider};
pub use queue_status_provider::{FetchError, QueueStatusProvider};
