//! Retry with exponential backoff for completion requests.

use otto_types::LlmError;
use rand::Rng;

/// Backoff behavior for transient completion errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Delay in milliseconds before the first retry.
    pub initial_delay_ms: u64,
    /// Ceiling for any computed delay.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay in milliseconds before retry number `attempt`.
    ///
    /// A server-provided `Retry-After` wins (clamped to the ceiling).
    /// Otherwise `initial_delay_ms * backoff_factor^attempt` with ±25%
    /// jitter, clamped to the ceiling.
    pub fn delay_for(&self, attempt: u32, retry_after_ms: Option<u64>) -> u64 {
        if let Some(server_delay) = retry_after_ms {
            return server_delay.min(self.max_delay_ms);
        }

        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);
        let jittered = clamped * rand::rng().random_range(0.75..=1.25);

        (jittered as u64).min(self.max_delay_ms)
    }
}

/// Whether `error` is transient and the request should be retried.
pub fn is_retryable(error: &LlmError) -> bool {
    error.is_transient()
}
