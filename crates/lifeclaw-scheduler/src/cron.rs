//! Minimal cron expression matching for the sweep schedules.
//! 5-field form "MIN HOUR DOM MON DOW"; minute and hour are honored, the
//! calendar fields accept only `*` semantics. Supports `*`, `*/N`, comma
//! lists, and single values — enough for daily-at-an-hour and hourly jobs
//! without pulling in a cron crate.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Next instant strictly after `after` matching the expression, or `None`
/// for an unparsable expression.
pub fn next_run_after(expression: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    if parts.len() != 5 {
        tracing::warn!(
            "Invalid cron expression '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
            expression
        );
        return None;
    }

    let minutes = parse_field(parts[0], 0, 59)?;
    let hours = parse_field(parts[1], 0, 23)?;

    let mut candidate = (after + Duration::minutes(1))
        .with_second(0)
        .unwrap_or(after);

    // Minute/hour fields repeat within 48h; scanning that far always finds a
    // match for a valid expression.
    for _ in 0..(48 * 60) {
        if minutes.contains(&candidate.minute()) && hours.contains(&candidate.hour()) {
            return Some(candidate);
        }
        candidate += Duration::minutes(1);
    }

    None
}

fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }

    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some((min..=max).step_by(n as usize).collect());
    }

    if field.contains(',') {
        let values: std::result::Result<Vec<u32>, _> =
            field.split(',').map(|s| s.trim().parse()).collect();
        return values
            .ok()
            .map(|v| v.into_iter().filter(|x| *x >= min && *x <= max).collect());
    }

    let n: u32 = field.parse().ok()?;
    (n >= min && n <= max).then_some(vec![n])
}
