//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to the node:
//!     → timeouts.rs (bound each attempt by the per-request timeout)
//!     → On failure: retries.rs (classify, check remaining budget)
//!     → backoff.rs (base * 2^attempt before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retry loop is an explicit bounded loop owned by the executor
//! - Backoff is deterministic (no jitter) so delays are exactly predictable

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{classify_status, RetryPolicy, StatusClass};
