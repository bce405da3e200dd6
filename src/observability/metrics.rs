//! Metrics collection.
//!
//! # Responsibilities
//! - Define client metrics (attempts, retries, status polls, finality waits)
//! - Record through the `metrics` facade; exporting is up to the embedder
//!
//! # Metrics
//! - `tx_client_attempts_total` (counter): request attempts by method, outcome
//! - `tx_client_retries_total` (counter): retries scheduled by method
//! - `tx_client_status_polls_total` (counter): status observations by status
//! - `tx_client_finality_wait_seconds` (histogram): time to terminal status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels stay low-cardinality (no URLs, no hashes)

use std::time::Duration;

use reqwest::Method;

use crate::transaction::TransactionStatus;

/// Outcome label for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable,
    Rejected,
    Malformed,
}

impl AttemptOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Retryable => "retryable",
            AttemptOutcome::Rejected => "rejected",
            AttemptOutcome::Malformed => "malformed",
        }
    }
}

/// Record one request attempt.
pub fn record_attempt(method: &Method, outcome: AttemptOutcome) {
    ::metrics::counter!(
        "tx_client_attempts_total",
        "method" => method.as_str().to_owned(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a scheduled retry.
pub fn record_retry(method: &Method) {
    ::metrics::counter!("tx_client_retries_total", "method" => method.as_str().to_owned())
        .increment(1);
}

/// Record an observed transaction status.
pub fn record_status_poll(status: TransactionStatus) {
    ::metrics::counter!("tx_client_status_polls_total", "status" => status.as_str()).increment(1);
}

/// Record how long a finality wait took to reach `status`.
pub fn record_finality_wait(status: TransactionStatus, elapsed: Duration) {
    ::metrics::histogram!("tx_client_finality_wait_seconds", "status" => status.as_str())
        .record(elapsed.as_secs_f64());
}
