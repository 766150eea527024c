use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use super::FetchError;

/// Bounds for one logical fetch operation. The wait doubles from the initial
/// interval up to the maximum; `timeout_millis` applies per HTTP exchange,
/// not to the operation as a whole.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retry_limit: u32,
    pub initial_retry_interval_millis: u64,
    pub maximum_retry_interval_millis: u64,
    pub timeout_millis: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 5,
            initial_retry_interval_millis: 1000,
            maximum_retry_interval_millis: 120_000,
            timeout_millis: 300_000,
        }
    }
}

impl RetryPolicy {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    /// Wait before retry `attempt` (1-based).
    pub fn wait_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_retry_interval_millis
            .saturating_mul(1u64 << exp)
            .min(self.maximum_retry_interval_millis);
        Duration::from_millis(millis)
    }
}

/// One failed attempt that will be retried.
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    pub attempt: u32,
    pub limit: u32,
    pub wait: Duration,
    pub status_code: i32,
    pub message: String,
}

/// Emitted once when the operation is abandoned, whether the budget ran out
/// or the failure was non-retryable.
#[derive(Debug, Clone)]
pub struct GiveUpEvent {
    pub attempts: u32,
    pub last_status_code: i32,
    pub message: String,
}

pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, attempt: &RetryAttempt);
    fn on_give_up(&self, give_up: &GiveUpEvent);
}

/// Default observer: structured warnings, one per retry and one at give-up.
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, attempt: &RetryAttempt) {
        warn!(
            attempt = attempt.attempt,
            limit = attempt.limit,
            wait_secs = attempt.wait.as_secs(),
            status = attempt.status_code,
            "retrying after failure: {}",
            attempt.message
        );
    }

    fn on_give_up(&self, give_up: &GiveUpEvent) {
        warn!(
            attempts = give_up.attempts,
            status = give_up.last_status_code,
            "retry limit exceeded: {}",
            give_up.message
        );
    }
}

/// Terminal retrieval failure, carrying the last underlying error.
#[derive(Error, Debug)]
#[error("gave up after {attempts} attempt(s): {source}")]
pub struct GiveUpError {
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts the retry budget.
///
/// The backoff wait is the only suspension point; dropping the returned
/// future during the wait cancels the operation without emitting a give-up.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    observer: &dyn RetryObserver,
    mut operation: F,
) -> Result<T, GiveUpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let retries_used = attempts - 1;
        if !err.is_retryable() || retries_used >= policy.retry_limit {
            observer.on_give_up(&GiveUpEvent {
                attempts,
                last_status_code: err.status_code(),
                message: err.to_string(),
            });
            return Err(GiveUpError {
                attempts,
                source: err,
            });
        }

        let wait = policy.wait_for(attempts);
        observer.on_retry(&RetryAttempt {
            attempt: attempts,
            limit: policy.retry_limit,
            wait,
            status_code: err.status_code(),
            message: err.to_string(),
        });
        tokio::time::sleep(wait).await;
    }
}
