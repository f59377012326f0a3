//! Escalation policy — lead-time reminder schedules.
//!
//! All functions here are pure: (obligation, time context) → reminder drafts.
//! Persistence and push delivery stay with the callers.

use chrono::{DateTime, Duration, Utc};

use lifeclaw_core::time::{days_overdue, plural};
use lifeclaw_core::types::{Obligation, PushMessage, ReminderDraft, RiskLevel};

/// Reminder lead times in days before the due date, densest for high risk.
pub fn lead_times(risk: RiskLevel) -> &'static [i64] {
    match risk {
        RiskLevel::High => &[14, 7, 3, 1],
        RiskLevel::Medium => &[7, 3, 1],
        RiskLevel::Low => &[3, 1],
    }
}

/// Creation-time reminder set. A lead time is realized only when
/// `days_until_due > lead_time` — lead times already in the past are skipped,
/// never back-filled.
pub fn creation_reminders(obligation: &Obligation, days_until_due: i64) -> Vec<ReminderDraft> {
    let mut reminders = Vec::new();
    for &days_before in lead_times(obligation.risk_level) {
        if days_until_due <= days_before {
            continue;
        }
        let consequence = obligation
            .consequence
            .as_deref()
            .map(|c| format!(" Consequence: {c}"))
            .unwrap_or_default();
        reminders.push(ReminderDraft {
            title: format!("Reminder: {}", obligation.title),
            description: format!(
                "{} is due in {} day{}.{}",
                obligation.title,
                days_before,
                plural(days_before),
                consequence
            ),
            remind_at: obligation.due_date - Duration::days(days_before),
            ai_generated: true,
        });
    }
    reminders
}

/// Immediate escalation for a newly overdue high-risk obligation. Fires now;
/// the title carries the exact elapsed-days count so re-runs within the same
/// day produce the same title.
pub fn overdue_alert(obligation: &Obligation, now: DateTime<Utc>) -> ReminderDraft {
    let days = days_overdue(obligation.due_date, now);
    ReminderDraft {
        title: format!(
            "URGENT: {} is {} day{} overdue",
            obligation.title,
            days,
            plural(days)
        ),
        description: format!(
            "High-risk obligation overdue. {}",
            obligation
                .consequence
                .as_deref()
                .unwrap_or("Immediate action required.")
        ),
        remind_at: now,
        ai_generated: true,
    }
}

/// Push payload accompanying an overdue alert.
pub fn overdue_push(obligation: &Obligation, now: DateTime<Utc>) -> PushMessage {
    let days = days_overdue(obligation.due_date, now);
    PushMessage {
        title: "Urgent: Overdue Obligation".into(),
        body: format!(
            "{} is {} day{} overdue",
            obligation.title,
            days,
            plural(days)
        ),
        data: serde_json::json!({
            "obligation_id": obligation.id,
            "type": "overdue",
        }),
    }
}

/// Hour-denominated reminder for the urgent sweep. Distinct from the
/// day-denominated creation reminders and deliberately not deduped against
/// them.
pub fn urgent_alert(
    obligation: &Obligation,
    hours_until_due: i64,
    now: DateTime<Utc>,
) -> ReminderDraft {
    ReminderDraft {
        title: format!(
            "URGENT: {} due in {} hour{}",
            obligation.title,
            hours_until_due,
            plural(hours_until_due)
        ),
        description: obligation
            .consequence
            .clone()
            .unwrap_or_else(|| "Action required soon.".into()),
        remind_at: now,
        ai_generated: true,
    }
}
