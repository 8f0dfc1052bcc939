// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Retry with exponential backoff for per-chain fetches.
//!
//! The policy never inspects error text. It only looks at the
//! [`FailureKind`](crate::FailureKind) the query executor attached:
//!
//! - `Terminal` failures are never retried.
//! - `Transient` failures are retried up to `max_retries` times after the
//!   first attempt, sleeping `min(base_delay * 2^attempt, max_delay)` before
//!   each retry.
//!
//! With the defaults (3 retries, 1s base, 3s cap) a chain that keeps failing is
//! attempted 4 times with 1s, 2s, 3s pauses in between.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::chain::ChainId;
use crate::errors::FetchError;

/// Default maximum number of retry attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff (1s).
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default maximum delay between retries (3s).
pub const DEFAULT_MAX_DELAY_MS: u64 = 3_000;

/// Retry configuration applied to every per-chain fetch.
///
/// # Example
///
/// ```rust
/// use multiscan::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_before_attempt(0), Duration::from_secs(1));
/// assert_eq!(policy.delay_before_attempt(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_before_attempt(2), Duration::from_secs(3));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial request).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Creates a builder for customizing the policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// A policy that never retries.
    ///
    /// Useful in tests and for callers that retry on their own.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Whether a failed attempt should be retried.
    ///
    /// `attempt` counts retries already made, so the first failure is
    /// evaluated with `attempt == 0`.
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        !error.is_terminal() && attempt < self.max_retries
    }

    /// Delay to sleep before retry number `attempt + 1`.
    ///
    /// Uses exponential backoff: `min(base_delay * 2^attempt, max_delay)`
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let delay_ms = self
            .base_delay
            .as_millis()
            .saturating_mul(u128::from(multiplier));
        let capped_delay_ms = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(u64::try_from(capped_delay_ms).unwrap_or(u64::MAX))
    }

    /// Run `operation` for `chain` until it succeeds, fails terminally, or
    /// exhausts its retries.
    ///
    /// # Errors
    ///
    /// Returns the last failure.
    pub async fn run<T, F, Fut>(&self, chain: ChainId, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(chain_id = %chain, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if error.is_terminal() {
                        debug!(
                            chain_id = %chain,
                            error = %error,
                            "Terminal failure, not retrying"
                        );
                        return Err(error);
                    }

                    if !self.should_retry(attempt, &error) {
                        warn!(
                            chain_id = %chain,
                            error = %error,
                            attempts = attempt + 1,
                            "Max retries exceeded"
                        );
                        return Err(error);
                    }

                    let delay = self.delay_before_attempt(attempt);
                    warn!(
                        chain_id = %chain,
                        error = %error,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis(),
                        "Transient failure, backing off"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Builder for configuring a [`RetryPolicy`].
#[derive(Clone, Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retry attempts.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum retries (not including the initial request)
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Sets the base delay for exponential backoff.
    ///
    /// The actual delay for attempt `n` will be `min(base_delay * 2^n, max_delay)`.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Builds the configured [`RetryPolicy`].
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DecodeError, IndexerError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn transient() -> FetchError {
        FetchError::from(IndexerError::Status { status: 503 })
    }

    fn terminal() -> FetchError {
        FetchError::from(DecodeError::unsupported("token 0xdead"))
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::builder()
            .max_retries(5)
            .base_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(60))
            .build();

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_before_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before_attempt(2), Duration::from_secs(3));
        assert_eq!(policy.delay_before_attempt(10), Duration::from_secs(3));
        assert_eq!(policy.delay_before_attempt(u32::MAX), Duration::from_secs(3));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0, &transient()));
        assert!(policy.should_retry(2, &transient()));
        assert!(!policy.should_retry(3, &transient()));
        assert!(!policy.should_retry(0, &terminal()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_transient_until_exhausted() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(ChainId::SEPOLIA, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 3s
        assert!(start.elapsed() >= Duration::from_secs(6));
        assert!(start.elapsed() < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_terminal() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(ChainId::SEPOLIA, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(terminal()) }
            })
            .await;

        assert!(result.unwrap_err().is_terminal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run(ChainId::SEPOLIA, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(transient())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
    }
}
