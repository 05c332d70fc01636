//! Clock and age helpers.
//!
//! Engine functions never read the clock. Callers pass `now` explicitly;
//! [`now_unix_secs`] exists for the CLI and tests.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::SECONDS_PER_DAY;

/// Current UTC time as Unix seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Age in seconds of something stamped at `timestamp`, as seen at `now`.
/// Timestamps in the future (clock skew) have age zero.
pub fn age_secs(timestamp: u64, now: u64) -> f64 {
    now.saturating_sub(timestamp) as f64
}

/// Convert a duration in days to seconds.
pub fn days_to_secs(days: f64) -> f64 {
    days * SECONDS_PER_DAY
}
