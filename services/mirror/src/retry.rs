//! Retry with exponential backoff for transient gateway failures

use crate::gateway::GatewayError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// No retries, for tests that want failures surfaced immediately
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Run `op`, retrying only [`GatewayError::Unavailable`]
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut retry_count = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry_count < self.max_retries => {
                    retry_count += 1;
                    warn!(
                        "Gateway unavailable for {}, retry {} of {} with {}ms backoff",
                        what,
                        retry_count,
                        self.max_retries,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.max_backoff);
                }
                Err(e) => {
                    if e.is_transient() {
                        error!("{} failed after {} retries: {}", what, retry_count, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
