// Tracker constants (no magic values)
use std::time::Duration;

/// Regular polling cadence (60s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Polling cadence once the target is close (30s)
pub const NEAR_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Remaining gap below which the near cadence kicks in
pub const NEAR_THRESHOLD: i64 = 3;

/// Upper bound on a single status fetch (2s)
/// Also bounds how late a stop request can be observed
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(2);
