//! Transaction broadcasting client with polling-based finality monitoring.

pub mod config;
pub mod observability;
pub mod resilience;
pub mod transaction;

pub use config::ClientConfig;
pub use transaction::{
    BroadcastAndWaitError, BroadcastResult, PollPolicy, TransactionClient, TransactionError,
    TransactionStatus,
};
