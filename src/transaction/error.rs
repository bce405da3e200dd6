//! Error taxonomy for broadcast and finality operations.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use thiserror::Error;

use crate::transaction::types::{TransactionStatus, UnknownStatusError};

/// Failure below HTTP: the attempt never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset, ...
    #[error("connection error: {0}")]
    Connect(String),

    /// Response started but the body could not be read.
    #[error("failed to read response body: {0}")]
    Read(String),

    /// The attempt exceeded the per-request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a single retryable attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 5xx or 429 from the server.
    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },
}

/// Kind of failure, independent of where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection or timeout failures, after exhausting retries.
    TransientNetwork,
    /// 5xx / 429, after exhausting retries.
    ServerOverload,
    /// 4xx other than 429.
    ClientError,
    /// Unexpected response shape or status value.
    ProtocolViolation,
    /// No terminal status within the allowed wait.
    FinalityTimeout,
    /// Local misconfiguration or encoding failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TransientNetwork => "transient network failure",
            ErrorKind::ServerOverload => "server overload",
            ErrorKind::ClientError => "client error",
            ErrorKind::ProtocolViolation => "protocol violation",
            ErrorKind::FinalityTimeout => "finality timeout",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Retryable failures persisted through every attempt.
    #[error("request {method} {url} failed after {attempts} attempts")]
    RequestFailed {
        method: Method,
        url: String,
        attempts: u32,
        #[source]
        source: AttemptError,
    },

    /// The node rejected the request; retrying will not help.
    #[error("{method} {url} failed with {status}: {body}")]
    ClientError {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    /// A successful response did not have the expected shape.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// The node reported a status outside the known set.
    #[error("unknown transaction status: {0}")]
    UnknownStatus(String),

    /// Status stayed non-terminal until the deadline.
    #[error(
        "transaction {tx_hash} stayed {last_status} for {:.1}s (max_wait={:.1}s)",
        .elapsed.as_secs_f64(),
        .max_wait.as_secs_f64()
    )]
    FinalityTimeout {
        tx_hash: String,
        last_status: TransactionStatus,
        elapsed: Duration,
        max_wait: Duration,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl TransactionError {
    /// Map onto the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::RequestFailed { source, .. } => match source {
                AttemptError::Transport(_) => ErrorKind::TransientNetwork,
                AttemptError::Status { .. } => ErrorKind::ServerOverload,
            },
            TransactionError::ClientError { .. } => ErrorKind::ClientError,
            TransactionError::MalformedResponse { .. } | TransactionError::UnknownStatus(_) => {
                ErrorKind::ProtocolViolation
            }
            TransactionError::FinalityTimeout { .. } => ErrorKind::FinalityTimeout,
            TransactionError::Encode(_) | TransactionError::InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is a finality timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransactionError::FinalityTimeout { .. })
    }

    /// Whether the failure may go away if the caller starts over later.
    ///
    /// The client itself never retries these again; this is a hint for
    /// higher-level callers.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::ServerOverload | ErrorKind::FinalityTimeout
        )
    }
}

impl From<UnknownStatusError> for TransactionError {
    fn from(err: UnknownStatusError) -> Self {
        TransactionError::UnknownStatus(err.0)
    }
}

/// Stage of [`broadcast_and_wait`](crate::transaction::TransactionClient::broadcast_and_wait)
/// that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Broadcast,
    Finality,
}

/// Failure of the combined broadcast-then-wait operation.
#[derive(Debug, Error)]
pub enum BroadcastAndWaitError {
    #[error("broadcast failed")]
    Broadcast(#[source] TransactionError),

    #[error("waiting for finality of {tx_hash} failed")]
    Finality {
        tx_hash: String,
        #[source]
        source: TransactionError,
    },
}

impl BroadcastAndWaitError {
    pub fn stage(&self) -> Stage {
        match self {
            BroadcastAndWaitError::Broadcast(_) => Stage::Broadcast,
            BroadcastAndWaitError::Finality { .. } => Stage::Finality,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner().kind()
    }

    /// The stage's own error, unchanged.
    pub fn inner(&self) -> &TransactionError {
        match self {
            BroadcastAndWaitError::Broadcast(err) => err,
            BroadcastAndWaitError::Finality { source, .. } => source,
        }
    }

    pub fn into_inner(self) -> TransactionError {
        match self {
            BroadcastAndWaitError::Broadcast(err) => err,
            BroadcastAndWaitError::Finality { source, .. } => source,
        }
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
