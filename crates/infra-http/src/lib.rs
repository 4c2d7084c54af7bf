// Ticketwatch Infrastructure - HTTP Adapter
// Implements: QueueStatusProvider over the remote wait-info feed

pub mod feed;
pub mod provider;

pub use feed::parse_feed;
pub use provider::{HttpProviderConfig, HttpQueueStatusProvider};
