//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for mash start, timer bounds and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Shift `start` forward by `seconds`, saturating instead of overflowing.
#[must_use]
pub fn add_seconds(start: Timestamp, seconds: u64) -> Timestamp {
    let delta = i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX);
    start.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left until `deadline`, or `None` when it is not strictly in the future.
#[must_use]
pub fn until(deadline: Timestamp, now: Timestamp) -> Option<std::time::Duration> {
    (deadline - now).to_std().ok().filter(|d| !d.is_zero())
}
