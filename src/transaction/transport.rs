//! Outbound transport port and its HTTP adapter.
//!
//! # Responsibilities
//! - Carry one request attempt to the node and hand back the raw response
//! - Report failures below HTTP as [`TransportError`]
//!
//! Classification, retries and timeouts live in the executor, so every
//! transport gets the same semantics.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};

use crate::transaction::error::TransportError;

/// One request attempt.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Already encoded body, if any.
    pub body: Option<Vec<u8>>,
}

/// Response as received, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// An `application/json` response.
    pub fn json(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.into(),
        }
    }

    /// A `text/plain` response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// Whether the body should be decoded as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }
}

/// Outbound port to the remote node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single attempt. Must not retry internally.
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom proxies, TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        // Decodes using the charset from the content type, UTF-8 otherwise.
        // A non-2xx status is kept even when its body is unreadable.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if !status.is_success() => {
                tracing::debug!(status = %status, error = %e, "Discarding unreadable error body");
                String::new()
            }
            Err(e) => return Err(TransportError::Read(e.to_string())),
        };

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
