//! Backoff for the HTTP adapters
//!
//! Retryable [`BackendError`]s (rate limits, timeouts, 5xx) are retried with a
//! doubling delay. The dispatcher never retries; a policy only exists when an
//! adapter config asks for one.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::error::BackendError;

/// How often and how patiently an adapter retries a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further one
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Randomize each delay into its upper half
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (zero based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        let delay = self
            .initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        if !self.jitter {
            return delay;
        }
        let millis = delay.as_millis() as u64;
        if millis < 2 {
            return delay;
        }
        Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
    }

    /// Send through `attempt` until it succeeds, fails permanently or the
    /// attempt budget is spent. The last error is returned.
    pub(crate) async fn run<F, Fut, T>(
        &self,
        provider_id: &str,
        mut attempt: F,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let budget = self.max_attempts.max(1);
        let mut failures = 0;
        loop {
            let error = match attempt().await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            failures += 1;
            if failures >= budget || !error.is_retryable() {
                return Err(error);
            }
            let delay = self.delay_for(failures - 1);
            tracing::debug!(
                target: "aiface::http",
                provider = provider_id,
                failures,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
