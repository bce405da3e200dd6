//! Request execution with bounded retries.
//!
//! # Responsibilities
//! - Build one outbound request per attempt (headers, encoded body)
//! - Bound each attempt by the per-request timeout
//! - Classify failures and retry transient ones with exponential backoff
//! - Decode successful bodies according to their content type
//!
//! # Failure Classification
//! ```text
//! transport error / timeout     → retryable
//! 5xx, 429                      → retryable
//! other 4xx                     → ClientError, immediately
//! undecodable 2xx body          → MalformedResponse, immediately
//! retries exhausted             → RequestFailed wrapping the last cause
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde_json::Value;
use tokio::time::sleep;
use uuid::Uuid;

use crate::observability::metrics::{self, AttemptOutcome};
use crate::resilience::timeouts::run_with_timeout;
use crate::resilience::{classify_status, RetryPolicy, StatusClass};
use crate::transaction::error::{AttemptError, TransactionError, TransactionResult, TransportError};
use crate::transaction::transport::{OutboundRequest, RawResponse, Transport};
use crate::transaction::types::ResponseBody;

const ACCEPT_VALUE: &str = "application/json,text/plain;q=0.9,*/*;q=0.8";

/// Executes logical requests against the node, retrying transient failures.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    request_timeout: Duration,
    user_agent: HeaderValue,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        request_timeout: Duration,
        user_agent: HeaderValue,
    ) -> Self {
        Self {
            transport,
            retry,
            request_timeout,
            user_agent,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Perform one logical call, retrying transient failures per the policy.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> TransactionResult<ResponseBody> {
        let body = body.map(serde_json::to_vec).transpose()?;
        let request_id = Uuid::new_v4();
        let headers = self.headers(body.is_some(), request_id);

        let mut attempt: u32 = 0;
        loop {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                url = %url,
                attempt = attempt + 1,
                "Sending request"
            );

            let request = OutboundRequest {
                method: method.clone(),
                url: url.to_string(),
                headers: headers.clone(),
                body: body.clone(),
            };
            let outcome = run_with_timeout(
                self.request_timeout,
                self.transport.send(request),
                TransportError::Timeout,
            )
            .await;

            let failure = match outcome {
                Ok(response) => match classify_status(response.status) {
                    StatusClass::Success => {
                        let decoded = decode_body(url, response);
                        let label = if decoded.is_ok() {
                            AttemptOutcome::Success
                        } else {
                            AttemptOutcome::Malformed
                        };
                        metrics::record_attempt(&method, label);
                        return decoded;
                    }
                    StatusClass::Retryable => AttemptError::Status {
                        status: response.status.as_u16(),
                        body: describe_body(&response),
                    },
                    StatusClass::ClientError => {
                        metrics::record_attempt(&method, AttemptOutcome::Rejected);
                        tracing::debug!(
                            request_id = %request_id,
                            status = %response.status,
                            "Request rejected by node"
                        );
                        return Err(TransactionError::ClientError {
                            method,
                            url: url.to_string(),
                            status: response.status.as_u16(),
                            body: describe_body(&response),
                        });
                    }
                    StatusClass::Unexpected => {
                        metrics::record_attempt(&method, AttemptOutcome::Malformed);
                        return Err(TransactionError::MalformedResponse {
                            url: url.to_string(),
                            reason: format!("unexpected status {}", response.status),
                        });
                    }
                },
                Err(e) => AttemptError::Transport(e),
            };

            metrics::record_attempt(&method, AttemptOutcome::Retryable);

            if attempt >= self.retry.max_retries {
                return Err(TransactionError::RequestFailed {
                    method,
                    url: url.to_string(),
                    attempts: attempt + 1,
                    source: failure,
                });
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                url = %url,
                attempt = attempt + 1,
                delay = ?delay,
                error = %failure,
                "Retrying request"
            );
            metrics::record_retry(&method);
            sleep(delay).await;
            attempt += 1;
        }
    }

    fn headers(&self, has_body: bool, request_id: Uuid) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert("x-request-id", value);
        }
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn decode_body(url: &str, response: RawResponse) -> TransactionResult<ResponseBody> {
    if response.is_json() {
        serde_json::from_str(&response.body)
            .map(ResponseBody::Json)
            .map_err(|e| TransactionError::MalformedResponse {
                url: url.to_string(),
                reason: format!("invalid JSON body: {}", e),
            })
    } else {
        Ok(ResponseBody::Text(response.body.trim().to_string()))
    }
}

/// Body text for error messages, falling back to the reason phrase.
fn describe_body(response: &RawResponse) -> String {
    let body = response.body.trim();
    if body.is_empty() {
        response
            .status
            .canonical_reason()
            .unwrap_or_default()
            .to_string()
    } else {
        body.to_string()
    }
}
