//! Finality polling.
//!
//! # State Machine
//! ```text
//! last_observed: none ──poll──▶ PENDING ──poll──▶ PENDING ... ──▶ CONFIRMED | FAILED | DNE
//!                                  │
//!                                  └── elapsed >= max_wait ──▶ FinalityTimeout
//! ```
//!
//! # Design Decisions
//! - The deadline runs from the start of the wait; retry delays inside a
//!   poll count against it but never extend it
//! - Observers see each transition once, in order; repeats are suppressed
//! - Unknown status strings are protocol violations and end the wait

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep, Instant};
use url::Url;

use crate::observability::metrics;
use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::executor::RequestExecutor;
use crate::transaction::types::{PollPolicy, ResponseBody, TransactionStatus};

/// Response field carrying the status in structured responses.
const TX_STATUS_FIELD: &str = "tx_status";

/// Receives status transitions observed while waiting for finality.
pub trait StatusSink {
    fn observe(&mut self, status: TransactionStatus);
}

impl<F> StatusSink for F
where
    F: FnMut(TransactionStatus),
{
    fn observe(&mut self, status: TransactionStatus) {
        self(status)
    }
}

/// Forwards transitions into a channel the caller drains.
///
/// A dropped receiver is ignored; the wait carries on.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub UnboundedSender<TransactionStatus>);

impl StatusSink for ChannelSink {
    fn observe(&mut self, status: TransactionStatus) {
        let _ = self.0.send(status);
    }
}

/// Observer argument of [`FinalityPoller::wait_for_finality`].
pub type StatusCallback<'a> = &'a mut (dyn StatusSink + Send);

/// Polls the status endpoint until a transaction reaches a terminal state.
#[derive(Debug, Clone)]
pub struct FinalityPoller {
    executor: Arc<RequestExecutor>,
    endpoint: String,
}

impl FinalityPoller {
    /// `endpoint` is the status URL prefix, e.g. `http://node/check`.
    pub fn new(executor: Arc<RequestExecutor>, endpoint: impl Into<String>) -> Self {
        Self {
            executor,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query the current status once.
    pub async fn check_status(&self, tx_hash: &str) -> TransactionResult<TransactionStatus> {
        let url = self.status_url(tx_hash)?;
        let response = self.executor.execute(Method::GET, &url, None).await?;
        let status = parse_status(&url, &response)?;
        metrics::record_status_poll(status);
        Ok(status)
    }

    /// `<endpoint>/<tx_hash>`, with the hash percent-encoded as one path segment.
    fn status_url(&self, tx_hash: &str) -> TransactionResult<String> {
        let invalid = || {
            TransactionError::InvalidConfig(format!(
                "status endpoint {} is not a base URL",
                self.endpoint
            ))
        };
        let mut url = Url::parse(&self.endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(tx_hash);
        Ok(url.into())
    }

    /// Poll until a terminal status is observed or `policy.max_wait` elapses.
    pub async fn wait_for_finality(
        &self,
        tx_hash: &str,
        policy: PollPolicy,
        mut on_status: Option<StatusCallback<'_>>,
    ) -> TransactionResult<TransactionStatus> {
        let start = Instant::now();
        let mut last_observed: Option<TransactionStatus> = None;

        loop {
            let status = self.check_status(tx_hash).await?;

            if last_observed != Some(status) {
                tracing::info!(
                    tx_hash = %tx_hash,
                    status = %status,
                    previous = ?last_observed,
                    "Transaction status changed"
                );
                if let Some(sink) = on_status.as_deref_mut() {
                    sink.observe(status);
                }
                last_observed = Some(status);
            }

            let elapsed = start.elapsed();
            if status.is_terminal() {
                metrics::record_finality_wait(status, elapsed);
                return Ok(status);
            }

            if elapsed >= policy.max_wait {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    status = %status,
                    elapsed = ?elapsed,
                    "Gave up waiting for finality"
                );
                return Err(TransactionError::FinalityTimeout {
                    tx_hash: tx_hash.to_string(),
                    last_status: status,
                    elapsed,
                    max_wait: policy.max_wait,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                elapsed = ?elapsed,
                next_poll_in = ?policy.poll_interval,
                "Transaction pending"
            );
            sleep(policy.poll_interval).await;
        }
    }
}

/// Accepts `{"tx_status": "..."}`, a JSON string, or a plain-text body.
fn parse_status(url: &str, response: &ResponseBody) -> TransactionResult<TransactionStatus> {
    let raw = match response {
        ResponseBody::Text(text) => text.as_str(),
        ResponseBody::Json(Value::String(text)) => text.as_str(),
        ResponseBody::Json(Value::Object(fields)) => match fields.get(TX_STATUS_FIELD) {
            Some(Value::String(text)) => text.as_str(),
            Some(other) => return Err(TransactionError::UnknownStatus(other.to_string())),
            None => {
                return Err(TransactionError::MalformedResponse {
                    url: url.to_string(),
                    reason: format!("missing {} field", TX_STATUS_FIELD),
                })
            }
        },
        ResponseBody::Json(other) => return Err(TransactionError::UnknownStatus(other.to_string())),
    };
    raw.trim()
        .parse::<TransactionStatus>()
        .map_err(TransactionError::from)
}
