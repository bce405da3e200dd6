//! Exponential backoff.

use std::time::Duration;

/// Calculate the delay to sleep after failed attempt `attempt` (0-indexed).
///
/// The delay is `base * 2^attempt`, saturating instead of overflowing.
pub fn calculate_backoff(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}
