//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every request attempt by its own deadline
//! - Turn an elapsed deadline into the caller's error type
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The per-attempt deadline is independent of the retry budget

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

/// Run `fut` for at most `limit`, mapping an elapsed deadline through `on_timeout`.
pub async fn run_with_timeout<F, T, E>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}
