//! Retry policy for page generation failures

use crate::error::EbookError;
use std::time::Duration;

/// Markers identifying a failure likely to succeed on retry. Matched as
/// case-sensitive substrings of the rendered error message.
const TRANSIENT_MARKERS: [&str; 4] = ["timeout", "rate limit", "temporary", "network"];

/// Whether an error message looks transient.
pub fn is_transient(message: &str) -> bool {
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Whether a failed attempt should be retried.
///
/// `attempt` is zero-based: the first failure passes `attempt = 0`, so a
/// ceiling of `max_retries = 3` allows four attempts in total. Anything
/// without a transient marker is fatal on the first failure.
pub fn should_retry(error: &EbookError, attempt: u32, max_retries: u32) -> bool {
    attempt < max_retries && is_transient(&error.to_string())
}

/// Delay before re-attempting, growing linearly with the attempt number:
/// 5s after the first failure, 10s after the second, 15s after the third.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(5_000 * (u64::from(attempt) + 1))
}
