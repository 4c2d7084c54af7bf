// Application Layer - Tracker engine and registry

pub mod registry;
pub mod tracker;

// Re-exports
pub use registry::{TrackerRegistry, UserKey};
pub use tracker::{
    CancellationToken, Tracker, TrackerCallbacks, TrackerConfig, TrackerEvent, TrackerId,
};
