// Queue Status Provider Port
// Abstraction over the remote queue feed (HTTP fetch + text parsing live in an adapter)

use crate::domain::QueueStatus;
use async_trait::async_trait;
use thiserror::Error;

/// Transient failure talking to the queue feed.
///
/// Never fatal for a tracker: it is reported and the next tick tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP request returned status code {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Invalid format: {0}")]
    Malformed(String),
}

/// Queue Status Provider trait
///
/// Implementations:
/// - HttpQueueStatusProvider: polls the remote wait-info endpoint
/// - MockQueueStatusProvider: scripted responses for tests
#[async_trait]
pub trait QueueStatusProvider: Send + Sync {
    /// Fetch the current queue status
    ///
    /// # Errors
    /// - FetchError::Request / Timeout on transport problems
    /// - FetchError::Status on a non-success response
    /// - FetchError::Malformed if the body is not in the expected format
    async fn fetch(&self) -> Result<QueueStatus, FetchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock provider serving a scripted sequence of responses.
    ///
    /// Once the script is exhausted the last response is repeated.
    pub struct MockQueueStatusProvider {
        script: Mutex<VecDeque<Result<QueueStatus, FetchError>>>,
        last: Mutex<Option<Result<QueueStatus, FetchError>>>,
        delay: Option<Duration>,
        call_count: AtomicUsize,
    }

    impl MockQueueStatusProvider {
        pub fn new(responses: Vec<Result<QueueStatus, FetchError>>) -> Self {
            Self {
                script: Mutex::new(responses.into()),
                last: Mutex::new(None),
                delay: None,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Always report `current` as the number being served
        pub fn serving(current: i64) -> Self {
            Self::new(vec![Ok(QueueStatus::new(Some(current), Some(0)))])
        }

        /// Sequence of current numbers, `None` meaning a placeholder
        pub fn serving_sequence(currents: &[Option<i64>]) -> Self {
            Self::new(
                currents
                    .iter()
                    .map(|c| Ok(QueueStatus::new(*c, Some(0))))
                    .collect(),
            )
        }

        pub fn failing(error: FetchError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// Sleep this long inside every fetch (simulates a slow endpoint)
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueueStatusProvider for MockQueueStatusProvider {
        async fn fetch(&self) -> Result<QueueStatus, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(response) => {
                    *last = Some(response.clone());
                    response
                }
                None => last
                    .clone()
                    .unwrap_or_else(|| Err(FetchError::Request("no scripted response".to_string()))),
            }
        }
    }
}
