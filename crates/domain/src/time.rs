//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, Utc};

/// UTC timestamp used for heartbeats and notification times.
pub type Timestamp = DateTime<Utc>;

/// Layout of heartbeat timestamps in the persisted snapshot (second precision).
pub const SNAPSHOT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Format a timestamp the way the snapshot stores it.
#[must_use]
pub fn format_snapshot(ts: Timestamp) -> String {
    ts.format(SNAPSHOT_FORMAT).to_string()
}

/// Parse a snapshot timestamp.
///
/// # Errors
///
/// Returns the chrono parse error when `value` does not follow [`SNAPSHOT_FORMAT`].
pub fn parse_snapshot(value: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, SNAPSHOT_FORMAT).map(|naive| naive.and_utc())
}
