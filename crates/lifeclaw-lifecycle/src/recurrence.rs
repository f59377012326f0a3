//! Next-cycle computation for recurring obligations.
//!
//! Calendar-aware throughout: monthly and yearly steps use calendar month
//! arithmetic, so a cycle anchored on Jan 31 lands on the last valid day of
//! February rather than a nonexistent Feb 31. The renewal-due check uses the
//! same arithmetic as the generator.

use chrono::{DateTime, Duration, Months, Utc};

use lifeclaw_core::types::{Frequency, Obligation, ObligationDraft};

/// One period of `frequency` after `date`.
pub fn advance(date: DateTime<Utc>, frequency: Frequency) -> DateTime<Utc> {
    match frequency {
        Frequency::Daily => date + Duration::days(1),
        Frequency::Weekly => date + Duration::days(7),
        Frequency::Monthly => date
            .checked_add_months(Months::new(1))
            .unwrap_or(date + Duration::days(30)),
        Frequency::Yearly => date
            .checked_add_months(Months::new(12))
            .unwrap_or(date + Duration::days(365)),
    }
}

/// Build the next-cycle draft for a recurring obligation. Returns `None` for
/// non-recurring obligations. No store access — duplicate-successor dedupe is
/// the renewal sweep's job.
pub fn next_cycle(obligation: &Obligation) -> Option<ObligationDraft> {
    let frequency = obligation.frequency?;
    Some(ObligationDraft {
        title: obligation.title.clone(),
        category: obligation.category,
        kind: obligation.kind,
        due_date: advance(obligation.due_date, frequency),
        frequency: Some(frequency),
        risk_level: Some(obligation.risk_level),
        consequence: obligation.consequence.clone(),
    })
}

/// Whether a completed recurring obligation is ready for its next cycle:
/// one full period has elapsed since the last completion.
pub fn renewal_due(obligation: &Obligation, now: DateTime<Utc>) -> bool {
    let (Some(last_completed), Some(frequency)) =
        (obligation.last_completed_at, obligation.frequency)
    else {
        return false;
    };
    now >= advance(last_completed, frequency)
}
