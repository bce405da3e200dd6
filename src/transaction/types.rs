//! Transaction data model.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::PollingConfig;

/// Payload submitted to the broadcast endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub symbol: String,
    pub price: u64,
    pub timestamp: u64,
}

impl TransactionRequest {
    pub fn new(symbol: impl Into<String>, price: u64, timestamp: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}

/// Outcome of a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Hash assigned by the node.
    pub tx_hash: String,
    /// The exact request that was sent.
    pub payload: TransactionRequest,
}

/// Lifecycle state reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
    /// The node does not know the transaction.
    Dne,
}

impl TransactionStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Dne => "DNE",
        }
    }

    /// Whether no further state change is expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction status: {0}")]
pub struct UnknownStatusError(pub String);

impl FromStr for TransactionStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "CONFIRMED" => Ok(TransactionStatus::Confirmed),
            "FAILED" => Ok(TransactionStatus::Failed),
            "DNE" => Ok(TransactionStatus::Dne),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// Polling cadence and deadline for finality waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl PollPolicy {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            Duration::from_millis(config.max_wait_ms),
        )
    }
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `application/json` content.
    Json(Value),
    /// Any other content type, trimmed.
    Text(String),
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => write!(f, "{:?}", text),
        }
    }
}
