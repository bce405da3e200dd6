//! Transaction broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! TransactionClient::broadcast_and_wait
//!     → coordinator.rs (POST <base>/broadcast, validate tx_hash)
//!     → poller.rs (GET <base>/check/<hash> until terminal or deadline)
//!         both via executor.rs (timeout, classify, retry with backoff)
//!             → transport.rs (reqwest, or any Transport impl)
//! ```
//!
//! # Design Decisions
//! - Control flows strictly downward; no component calls back into its caller
//! - No shared mutable state; per-operation state lives on the caller's task
//! - Terminal errors propagate unchanged, tagged with their stage only at the top

pub mod client;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod poller;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::TransactionClient;
pub use coordinator::BroadcastCoordinator;
pub use error::{
    AttemptError, BroadcastAndWaitError, ErrorKind, Stage, TransactionError, TransactionResult,
    TransportError,
};
pub use executor::RequestExecutor;
pub use poller::{ChannelSink, FinalityPoller, StatusCallback, StatusSink};
pub use transport::{HttpTransport, OutboundRequest, RawResponse, Transport};
pub use types::{
    BroadcastResult, PollPolicy, ResponseBody, TransactionRequest, TransactionStatus,
    UnknownStatusError,
};
