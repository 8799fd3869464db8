//! Timestamp derivation for day-offset timings.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Anchor for converting relative day offsets into absolute timestamps.
fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|date| date.and_hms_opt(10, 10, 0))
        .unwrap_or_default()
}

/// Timestamp `days_before` days before the anchor, in `%Y-%m-%dT%H:%M:%SZ`
/// form.
#[must_use]
pub fn day_offset_timestamp(days_before: i64) -> String {
    let moment = epoch() - Duration::days(days_before);
    moment.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
