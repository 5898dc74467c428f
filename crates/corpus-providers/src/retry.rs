//! Exponential backoff for provider calls, grounded on the
//! `RetryPolicy::exponential(n)` field `dashflow-openai`'s `OpenAIEmbeddings`
//! and `dashflow-anthropic`'s `ChatAnthropic` both carry.

use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Exponential backoff with jitter, applied around a single provider call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// `max_attempts` retries on top of the first try, starting at 100ms
    /// and doubling, with jitter.
    #[must_use]
    pub fn exponential(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 100,
        }
    }

    /// No retries; the first failure is final. Used by mocks and tests.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: 0,
        }
    }

    /// Run `operation`, retrying on `Err` per this policy.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let strategy = ExponentialBackoff::from_millis(self.base_delay_ms)
            .map(jitter)
            .take(self.max_attempts);
        Retry::spawn(strategy, || operation()).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3)
    }
}

/// Convenience constant so callers don't need a runtime sleep in tests that
/// exercise retry counting without real backoff.
pub const ZERO_DELAY: Duration = Duration::from_millis(0);
