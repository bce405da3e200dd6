//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! executor / coordinator / poller produce:
//!     → tracing events (attempts, retries, status transitions)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr)
//!     → any `metrics` recorder the embedder installs
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is shared by all attempts of one call
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
