//! Retry policy for provider calls.
//!
//! Exponential backoff with a configurable growth factor and delay cap.
//! Only errors the adapter classified as retryable are retried; a fatal
//! error returns on the first attempt. Waits are cooperative tokio sleeps,
//! so tests drive them with the paused clock.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use lvid_providers::{ProviderError, ProviderResult};

use crate::metrics::record_retry;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied to the backoff schedule.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub growth_factor: f64,
    /// Provider name for logging and metrics.
    pub provider: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            growth_factor: 2.0,
            provider: "provider".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config for the given provider name.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Delay before retry attempt `attempt` (0-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_millis() as f64 * self.growth_factor.powi(attempt as i32);
        let capped = (scaled as u64).min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

/// Execute a provider call with retry.
///
/// `on_retry(attempt, delay, error)` fires before each wait; the pipeline
/// uses it for logging, tests use it to observe the schedule.
pub async fn run_with_retry<F, Fut, T, H>(
    config: &RetryConfig,
    operation: F,
    mut on_retry: H,
) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
    H: FnMut(u32, Duration, &ProviderError),
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;

                warn!(
                    provider = %config.provider,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Provider call failed, retrying: {}",
                    e
                );

                record_retry(&config.provider);
                on_retry(attempt, delay, &e);

                tokio::time::sleep(delay).await;
            }
            Err(mut e) => {
                if attempt > 0 {
                    e.message = format!("{} (after {} attempts)", e.message, attempt + 1);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig::new("test")
            .with_max_retries(3)
            .with_base_delay(Duration::from_millis(100))
    }

    #[test]
    fn test_delay_schedule_grows_and_caps() {
        let config = RetryConfig::new("test")
            .with_base_delay(Duration::from_secs(3))
            .with_max_delay(Duration::from_secs(60))
            .with_growth_factor(2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(3));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(6));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(12));
        // Capped well before 3 * 2^10
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(60));
    }

    #[test]
    fn test_fractional_growth_factor() {
        let config = RetryConfig::new("test")
            .with_base_delay(Duration::from_millis(1000))
            .with_growth_factor(1.2);

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1440));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_retryable_failures() {
        let calls = AtomicU32::new(0);

        let result = run_with_retry(
            &fast_config(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ProviderError::retryable("503"))
                    } else {
                        Ok(42)
                    }
                }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_with_attempt_count() {
        let calls = AtomicU32::new(0);

        let result: ProviderResult<()> = run_with_retry(
            &fast_config(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::retryable("always 429")) }
            },
            |_, _, _| {},
        )
        .await;

        let err = result.unwrap_err();
        // max_retries retries + the initial attempt
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(err.message.contains("after 4 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_never_retried() {
        let calls = AtomicU32::new(0);

        let result: ProviderResult<()> = run_with_retry(
            &fast_config(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::fatal("400 bad request")) }
            },
            |_, _, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_retry_hook_observes_schedule() {
        let mut observed = Vec::new();

        let _: ProviderResult<()> = run_with_retry(
            &RetryConfig::new("test")
                .with_max_retries(2)
                .with_base_delay(Duration::from_millis(100))
                .with_growth_factor(2.0),
            || async { Err(ProviderError::retryable("x")) },
            |attempt, delay, _| observed.push((attempt, delay)),
        )
        .await;

        assert_eq!(
            observed,
            vec![
                (1, Duration::from_millis(100)),
                (2, Duration::from_millis(200)),
            ]
        );
    }
}
