//! Timestamp helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp type (seconds since the Unix epoch), as carried in `TimeStamp`
pub type Timestamp = u64;

/// Current Unix timestamp in seconds
pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
