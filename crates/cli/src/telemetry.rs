//! Logging setup
//!
//! Logs go to stderr through a non-blocking writer so they never interleave
//! with notifications printed on stdout.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: overrides the configured filter (e.g. `ticketwatch=debug`)

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::{LogFormat, LogSettings};

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered log lines are flushed.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match settings.format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
        LogFormat::Pretty => {
            // Development: compact human-readable lines
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).with_writer(writer))
                .init();
        }
    }

    guard
}
