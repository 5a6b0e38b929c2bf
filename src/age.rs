//! age.rs
//!
//! Human-readable age of a push, in the format used by the activity feed:
//!     "N minutes ago" / "N hours ago" / "N days ago"
//!
//! Every branch floor-divides the elapsed milliseconds, so a push 119 minutes
//! old reads "1 hours ago". There is no pluralization; "1 minutes ago" is the
//! accepted output at the boundary.

use chrono::{DateTime, Utc};

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Returns how long ago `pushed_at` was, relative to `now`.
pub fn relative_age(pushed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // Clock skew can put a push slightly in the future; treat it as "just now".
    let elapsed = (now - pushed_at).num_milliseconds().max(0);

    let minutes = elapsed / MS_PER_MINUTE;
    let hours = elapsed / MS_PER_HOUR;
    let days = elapsed / MS_PER_DAY;

    if minutes < 60 {
        format!("{minutes} minutes ago")
    } else if hours < 24 {
        format!("{hours} hours ago")
    } else {
        format!("{days} days ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn minutes_branch() {
        assert_eq!(relative_age(now(), now()), "0 minutes ago");
        assert_eq!(relative_age(now() - Duration::seconds(90), now()), "1 minutes ago");
        assert_eq!(relative_age(now() - Duration::minutes(59), now()), "59 minutes ago");
    }

    #[test]
    fn hours_branch() {
        assert_eq!(relative_age(now() - Duration::minutes(60), now()), "1 hours ago");
        assert_eq!(relative_age(now() - Duration::minutes(119), now()), "1 hours ago");
        assert_eq!(
            relative_age(now() - Duration::hours(23) - Duration::minutes(59), now()),
            "23 hours ago"
        );
    }

    #[test]
    fn days_branch() {
        assert_eq!(relative_age(now() - Duration::hours(24), now()), "1 days ago");
        assert_eq!(relative_age(now() - Duration::days(400), now()), "400 days ago");
    }

    #[test]
    fn future_timestamp_is_clamped() {
        assert_eq!(relative_age(now() + Duration::hours(3), now()), "0 minutes ago");
    }
}
