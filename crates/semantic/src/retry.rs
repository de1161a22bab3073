//! Retry logic with exponential backoff for transient failures.
//!
//! Failed calls are retried with increasing delays when the error reports itself as transient
//! (timeouts, connection resets, 429 and 5xx answers). Anything else is returned immediately.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

/// Errors that know whether trying again could help.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts. `0` disables retries.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    /// Upper bound for a single delay in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt + 1`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
        let delay = exponential.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            // 0-50% on top
            let jitter = fastrand::u64(0..=delay / 2);
            Duration::from_millis(delay + jitter)
        } else {
            Duration::from_millis(delay)
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries needed).
    pub attempts: u32,
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Execute an async operation, retrying transient failures.
///
/// # Example
///
/// ```
/// use semantic::retry::{execute_with_retry_async, RetryConfig, Retryable};
///
/// #[derive(Debug)]
/// struct Flaky;
/// impl Retryable for Flaky {
///     fn is_transient(&self) -> bool { true }
/// }
/// impl std::fmt::Display for Flaky {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("flaky")
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let config = RetryConfig::default()
///         .with_jitter(false)
///         .with_base_delay(std::time::Duration::from_millis(1));
///     let outcome = execute_with_retry_async(&config, |attempt| async move {
///         if attempt < 1 { Err(Flaky) } else { Ok("done") }
///     })
///     .await;
///     assert_eq!(outcome.attempts, 2);
/// }
/// ```
pub async fn execute_with_retry_async<T, E, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                };
            }
            Err(error) => {
                if attempt >= config.max_retries || !error.is_transient() {
                    return RetryResult {
                        result: Err(error),
                        attempts: attempt + 1,
                        total_duration: start.elapsed(),
                    };
                }
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying_transient_failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn quick() -> RetryConfig {
        RetryConfig::default()
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn retry_succeeds_eventually() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry_async(&quick(), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(result.succeeded());
        assert_eq!(result.attempts, 3);
        assert_eq!(result.into_result().unwrap(), "success");
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let result: RetryResult<(), _> =
            execute_with_retry_async(&quick().with_max_retries(2), |_| async {
                Err(TestError::Transient)
            })
            .await;

        assert!(!result.succeeded());
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let result: RetryResult<(), _> =
            execute_with_retry_async(&quick(), |_| async { Err(TestError::Fatal) }).await;
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn disabled_policy_makes_one_attempt() {
        let result: RetryResult<(), _> =
            execute_with_retry_async(&RetryConfig::disabled(), |_| async {
                Err(TestError::Transient)
            })
            .await;
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn delay_grows_and_caps() {
        let cfg = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_jitter(false);
        assert_eq!(cfg.delay_for(0), Duration::from_millis(100));
        assert_eq!(cfg.delay_for(1), Duration::from_millis(200));
        assert_eq!(cfg.delay_for(2), Duration::from_millis(300));
        assert_eq!(cfg.delay_for(40), Duration::from_millis(300));
    }

    #[test]
    fn durations_serialize_as_millis() {
        let json = serde_json::to_value(RetryConfig::default()).unwrap();
        assert_eq!(json["base_delay"], 250);
        assert_eq!(json["max_delay"], 5000);

        let parsed: RetryConfig = serde_json::from_str(r#"{"max_retries": 0}"#).unwrap();
        assert_eq!(parsed, RetryConfig::disabled());
    }
}
