//! Small deadline arithmetic helpers shared by the lifecycle core and the
//! sweeps. Ceiling semantics: an obligation due in 36 hours is "due in 2
//! days", one due 90 minutes ago is "1 day overdue".

use chrono::{DateTime, Utc};

const DAY_SECS: f64 = 86_400.0;
const HOUR_SECS: f64 = 3_600.0;

/// Whole days until `due`, rounded up. Negative when past due.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((due - now).num_seconds() as f64 / DAY_SECS).ceil() as i64
}

/// Whole hours until `due`, rounded up. Negative when past due.
pub fn hours_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((due - now).num_seconds() as f64 / HOUR_SECS).ceil() as i64
}

/// Whole days elapsed since `due`, rounded up, minimum 1. Only meaningful for
/// past-due instants.
pub fn days_overdue(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (((now - due).num_seconds() as f64 / DAY_SECS).ceil() as i64).max(1)
}

/// "day" vs "days".
pub fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until(now + Duration::hours(36), now), 2);
        assert_eq!(days_until(now + Duration::days(10), now), 10);
        assert_eq!(days_until(now - Duration::hours(2), now), 0);
        assert_eq!(days_until(now - Duration::days(3), now), -3);
    }

    #[test]
    fn test_hours_until() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(hours_until(now + Duration::minutes(90), now), 2);
        assert_eq!(hours_until(now + Duration::hours(24), now), 24);
    }

    #[test]
    fn test_days_overdue_floor_is_one() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(days_overdue(now - Duration::hours(2), now), 1);
        assert_eq!(days_overdue(now - Duration::days(5), now), 5);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "s");
    }
}
