//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// UTC timestamp recorded when an operation starts.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds left in `remaining`, rounded up.
///
/// A countdown that has just started on a 5 s operation reports 5 rather
/// than 4; only a fully elapsed duration reports 0.
#[must_use]
pub fn whole_seconds_left(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
