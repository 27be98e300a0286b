use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use whosaid_core::{ErrorExt, FeedError};

/// Configuration for retry behavior on feed requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Run `operation`, retrying retryable feed failures with exponential
/// backoff. Rate-limit hints from the feed override the computed delay.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let mut attempt = 1u32;
    let mut delay = Duration::from_millis(config.base_delay_ms);

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= config.max_attempts || !error.is_retryable() {
                    return Err(error);
                }

                if let Some(hint) = error.retry_after() {
                    delay = hint;
                }

                info!(
                    "Retrying feed request (attempt {}/{}) after {:?}: {}",
                    attempt, config.max_attempts, delay, error
                );
                sleep(delay).await;

                let next_ms = (delay.as_millis() as f64 * config.backoff_multiplier) as u64;
                delay = Duration::from_millis(next_ms.min(config.max_delay_ms));
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FeedError> = retry_with_backoff(&fast_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_retryable_errors_up_to_max() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FeedError> = retry_with_backoff(&fast_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FeedError::RequestTimeout) }
        })
        .await;
        assert!(matches!(result, Err(FeedError::RequestTimeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_unknown_handle() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FeedError> = retry_with_backoff(&fast_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FeedError::UnknownHandle {
                    handle: "alice".to_string(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(FeedError::UnknownHandle { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FeedError> = retry_with_backoff(&fast_config(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(FeedError::ServerError { status_code: 503 })
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
