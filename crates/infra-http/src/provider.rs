// HTTP queue status provider
// reason: reqwest for the GET, chrono for the date/cache-buster query params

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::feed::parse_feed;
use ticketwatch_core::domain::QueueStatus;
use ticketwatch_core::port::{FetchError, QueueStatusProvider};

/// Public wait-info endpoint
pub const DEFAULT_BASE_URL: &str =
    "http://vpn.weshine.com.tw:8088/WaitInfoWeb/WaitInfo_GIDOHandler.ashx";
pub const DEFAULT_DEPARTMENT: &str = "吉哆火鍋百匯";
pub const DEFAULT_KIND: &str = "a1";
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Where and how to query the feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpProviderConfig {
    pub base_url: String,
    /// `DEP_CODE` query parameter
    pub department: String,
    /// `Kind` query parameter
    pub kind: String,
    pub timeout_ms: u64,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            department: DEFAULT_DEPARTMENT.to_string(),
            kind: DEFAULT_KIND.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Polls the remote wait-info endpoint
pub struct HttpQueueStatusProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpQueueStatusProvider {
    /// Create a provider with its own HTTP client
    ///
    /// # Errors
    /// - FetchError::Request if the HTTP client cannot be built
    pub fn new(config: HttpProviderConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Query string for a request made at `now`: the feed is keyed by local
    /// date (YYYYMMDD) and takes an epoch-millis cache buster
    fn query_params(&self, now: DateTime<Local>) -> Vec<(&'static str, String)> {
        vec![
            ("act", "WaitInfo".to_string()),
            ("DEP_CODE", self.config.department.clone()),
            ("Kind", self.config.kind.clone()),
            ("date", now.format("%Y%m%d").to_string()),
            ("_", now.timestamp_millis().to_string()),
        ]
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout_ms)
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl QueueStatusProvider for HttpQueueStatusProvider {
    async fn fetch(&self) -> Result<QueueStatus, FetchError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query_params(Local::now()))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout_ms)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;
        debug!(body = %body.trim(), "Wait-info feed response");

        parse_feed(&body)
    }
}
