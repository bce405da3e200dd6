//! Retry logic.
//!
//! # Responsibilities
//! - Hold the retry budget of a single logical call (max retries, backoff base)
//! - Classify HTTP status codes into success, retryable and terminal
//!
//! # Design Decisions
//! - Connection errors and per-attempt timeouts are always retryable
//! - 5xx and 429 are retryable, every other 4xx fails immediately
//! - The same policy applies to every endpoint

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Retry budget for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles on every retry.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Upper bound on attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after failed attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.backoff_base)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.backoff_base_ms),
        )
    }
}

/// Outcome class of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Server overload (5xx, 429): worth another attempt.
    Retryable,
    /// Client error (4xx except 429): fail now.
    ClientError,
    /// Anything else (1xx, 3xx) is not part of the protocol.
    Unexpected,
}

/// Classify an HTTP status code.
pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        StatusClass::Retryable
    } else if status.is_client_error() {
        StatusClass::ClientError
    } else {
        StatusClass::Unexpected
    }
}
