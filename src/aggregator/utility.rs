use chrono::{DateTime, Utc};

/// Parses an ISO-8601 / RFC 3339 instant with any offset into UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole minutes until `when`, never negative.
///
/// The whole-second difference is counted exclusive of its upper bound, so
/// an arrival exactly 60 s away reports 0 and one 61 s away reports 1. The
/// same shift applies at every boundary: exactly 2:00 out shows 1 minute and
/// 2:01 shows 2.
pub fn minutes_until(when: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (when - now).num_seconds();
    (secs - 1).div_euclid(60).max(0)
}
