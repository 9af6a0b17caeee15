//! Retry for idempotent reads

use coincross_ports::ClientResult;
use log::warn;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Retry behaviour for read operations
///
/// Only `ClientError::Transport` failures are retried. Mutating calls
/// (`trade`, `cancel`) must never go through [`retry_read`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry attempts, not counting the initial request
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent
pub async fn retry_read<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    "{} failed: {}; retry {}/{} in {:?}",
                    what, e, attempt, config.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coincross_ports::ClientError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn test_delay_for_attempt() {
        let config = RetryConfig {
            initial_delay_ms: 100,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 400);
    }

    #[test]
    fn test_delay_caps_at_max() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 2000,
            backoff_factor: 10.0,
        };
        assert_eq!(config.delay_for_attempt(3).as_millis(), 2000);
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let calls = &AtomicU32::new(0);
        let result = retry_read(&fast(), "balance", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ClientError::Transport("reset".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = &AtomicU32::new(0);
        let result: ClientResult<()> = retry_read(&fast(), "orders", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Transport("down".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: ClientResult<()> = retry_read(&fast(), "balance", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Auth("bad key".to_string()))
        })
        .await;

        assert_eq!(result, Err(ClientError::Auth("bad key".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
