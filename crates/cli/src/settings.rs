//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. `TICKETWATCH_*` environment variables, `__` between section and key
//!    (e.g. `TICKETWATCH_TRACKER__POLL_INTERVAL_SECS=30`)

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use ticketwatch_core::application::tracker::constants::{
    DEFAULT_POLL_INTERVAL, FETCH_TIMEOUT, NEAR_POLL_INTERVAL, NEAR_THRESHOLD,
};
use ticketwatch_core::application::TrackerConfig;
use ticketwatch_core::AppError;
use ticketwatch_infra_http::HttpProviderConfig;

const ENV_PREFIX: &str = "TICKETWATCH";
const DEFAULT_LOG_FILTER: &str = "ticketwatch=info";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: HttpProviderConfig,
    pub tracker: TrackerSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub poll_interval_secs: u64,
    pub near_poll_interval_secs: u64,
    pub near_threshold: i64,
    pub fetch_timeout_ms: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            near_poll_interval_secs: NEAR_POLL_INTERVAL.as_secs(),
            near_threshold: NEAR_THRESHOLD,
            fetch_timeout_ms: u64::try_from(FETCH_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl TrackerSettings {
    /// Build a validated tracker config
    ///
    /// # Errors
    /// - AppError::Config for a zero interval or timeout, or a threshold below 1
    pub fn to_config(&self) -> Result<TrackerConfig, AppError> {
        let config = TrackerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            near_poll_interval: Duration::from_secs(self.near_poll_interval_secs),
            near_threshold: self.near_threshold,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Settings {
    /// Check everything that deserialized fine but cannot be used
    pub fn validate(&self) -> Result<(), AppError> {
        if self.feed.timeout_ms == 0 {
            return Err(AppError::Config(
                "feed.timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.tracker.to_config().map(|_| ())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// Structured JSON lines
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Load settings from defaults, an optional file and the environment
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
