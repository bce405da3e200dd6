//! Client facade tying broadcast and finality polling together.
//!
//! # Responsibilities
//! - Build the executor, coordinator and poller from a validated config
//! - Expose single-step operations (broadcast, status check, wait)
//! - Sequence broadcast then wait, tagging failures with their stage

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::config::{validate_config, ClientConfig};
use crate::resilience::RetryPolicy;
use crate::transaction::coordinator::BroadcastCoordinator;
use crate::transaction::error::{BroadcastAndWaitError, TransactionError, TransactionResult};
use crate::transaction::executor::RequestExecutor;
use crate::transaction::poller::{FinalityPoller, StatusCallback};
use crate::transaction::transport::{HttpTransport, Transport};
use crate::transaction::types::{BroadcastResult, PollPolicy, TransactionRequest, TransactionStatus};

/// Broadcasts transactions and waits for their final status.
///
/// Configuration is fixed at construction; clones share the transport and
/// can run independent operations concurrently.
#[derive(Debug, Clone)]
pub struct TransactionClient {
    base_url: String,
    coordinator: BroadcastCoordinator,
    poller: FinalityPoller,
    poll_policy: PollPolicy,
}

impl TransactionClient {
    /// Create a client talking HTTP to `config.node.base_url`.
    pub fn new(config: &ClientConfig) -> TransactionResult<Self> {
        let transport = HttpTransport::new()
            .map_err(|e| TransactionError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> TransactionResult<Self> {
        validate_config(config).map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            TransactionError::InvalidConfig(joined)
        })?;

        let user_agent = HeaderValue::from_str(&config.node.user_agent)
            .map_err(|e| TransactionError::InvalidConfig(format!("user agent: {}", e)))?;
        let base_url = config.node.base_url.trim_end_matches('/').to_string();

        let executor = Arc::new(RequestExecutor::new(
            transport,
            RetryPolicy::from(&config.retries),
            Duration::from_millis(config.timeouts.request_ms),
            user_agent,
        ));
        let coordinator =
            BroadcastCoordinator::new(executor.clone(), format!("{}/broadcast", base_url));
        let poller = FinalityPoller::new(executor, format!("{}/check", base_url));

        tracing::debug!(
            base_url = %base_url,
            max_retries = config.retries.max_retries,
            request_timeout_ms = config.timeouts.request_ms,
            "Transaction client initialized"
        );

        Ok(Self {
            base_url,
            coordinator,
            poller,
            poll_policy: PollPolicy::from(&config.polling),
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Polling policy from the configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// Submit a transaction.
    pub async fn broadcast_transaction(
        &self,
        symbol: &str,
        price: u64,
        timestamp: u64,
    ) -> TransactionResult<BroadcastResult> {
        self.coordinator.broadcast(symbol, price, timestamp).await
    }

    /// Submit a prepared transaction request.
    pub async fn submit(&self, request: TransactionRequest) -> TransactionResult<BroadcastResult> {
        self.coordinator.submit(request).await
    }

    /// Fetch the current status of a transaction.
    pub async fn check_status(&self, tx_hash: &str) -> TransactionResult<TransactionStatus> {
        self.poller.check_status(tx_hash).await
    }

    /// Poll until the transaction reaches a terminal status.
    pub async fn wait_for_finality(
        &self,
        tx_hash: &str,
        policy: PollPolicy,
        on_status: Option<StatusCallback<'_>>,
    ) -> TransactionResult<TransactionStatus> {
        self.poller.wait_for_finality(tx_hash, policy, on_status).await
    }

    /// Broadcast, then wait for finality of the returned hash.
    pub async fn broadcast_and_wait(
        &self,
        symbol: &str,
        price: u64,
        timestamp: u64,
        policy: PollPolicy,
        on_status: Option<StatusCallback<'_>>,
    ) -> Result<(BroadcastResult, TransactionStatus), BroadcastAndWaitError> {
        let result = self
            .broadcast_transaction(symbol, price, timestamp)
            .await
            .map_err(BroadcastAndWaitError::Broadcast)?;

        let status = self
            .wait_for_finality(&result.tx_hash, policy, on_status)
            .await
            .map_err(|source| BroadcastAndWaitError::Finality {
                tx_hash: result.tx_hash.clone(),
                source,
            })?;

        Ok((result, status))
    }
}
