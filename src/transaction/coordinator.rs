//! Transaction submission.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::executor::RequestExecutor;
use crate::transaction::types::{BroadcastResult, ResponseBody, TransactionRequest};

/// Response field carrying the transaction hash.
const TX_HASH_FIELD: &str = "tx_hash";

/// Submits transactions to the broadcast endpoint.
#[derive(Debug, Clone)]
pub struct BroadcastCoordinator {
    executor: Arc<RequestExecutor>,
    endpoint: String,
}

impl BroadcastCoordinator {
    /// `endpoint` is the full broadcast URL, e.g. `http://node/broadcast`.
    pub fn new(executor: Arc<RequestExecutor>, endpoint: impl Into<String>) -> Self {
        Self {
            executor,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a request from its parts and submit it.
    pub async fn broadcast(
        &self,
        symbol: &str,
        price: u64,
        timestamp: u64,
    ) -> TransactionResult<BroadcastResult> {
        self.submit(TransactionRequest::new(symbol, price, timestamp))
            .await
    }

    /// Submit a prepared request.
    pub async fn submit(&self, payload: TransactionRequest) -> TransactionResult<BroadcastResult> {
        let body = serde_json::to_value(&payload)?;
        let response = self
            .executor
            .execute(Method::POST, &self.endpoint, Some(&body))
            .await?;

        let tx_hash =
            extract_tx_hash(&response).map_err(|reason| TransactionError::MalformedResponse {
                url: self.endpoint.clone(),
                reason,
            })?;

        tracing::info!(
            tx_hash = %tx_hash,
            symbol = %payload.symbol,
            price = payload.price,
            timestamp = payload.timestamp,
            "Transaction broadcast"
        );

        Ok(BroadcastResult { tx_hash, payload })
    }
}

fn extract_tx_hash(response: &ResponseBody) -> Result<String, String> {
    let ResponseBody::Json(Value::Object(fields)) = response else {
        return Err(format!("expected a JSON object, got {}", response));
    };

    match fields.get(TX_HASH_FIELD) {
        Some(Value::String(hash)) if !hash.trim().is_empty() => Ok(hash.clone()),
        Some(Value::String(_)) => Err(format!("{} is empty", TX_HASH_FIELD)),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(format!("missing {} field", TX_HASH_FIELD)),
        Some(other) => Err(format!("{} has unexpected value {}", TX_HASH_FIELD, other)),
    }
}
