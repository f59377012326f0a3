//! Obligation lifecycle orchestration: create (with preparation-item
//! generation), update, complete (triggering recurrence), delete, and the
//! overdue-detection sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use lifeclaw_core::error::Result;
use lifeclaw_core::time::days_until;
use lifeclaw_core::traits::{ObligationStore, ReminderStore, TaskStore};
use lifeclaw_core::types::{
    ExtractedPlan, Obligation, ObligationChanges, ObligationDraft, ObligationFilter,
    ObligationStats, ObligationStatus, PrepTask, Reminder, RiskLevel,
};

use crate::{escalation, preparation, recurrence};

/// Result of a create: the obligation plus everything generated alongside it.
#[derive(Debug, Serialize)]
pub struct CreatedObligation {
    pub obligation: Obligation,
    pub preparation_tasks: Vec<PrepTask>,
    pub reminders: Vec<Reminder>,
}

/// Result of accepting an extracted plan.
#[derive(Debug, Default, Serialize)]
pub struct PlanOutcome {
    pub obligations_created: usize,
    pub tasks_created: usize,
    pub reminders_created: usize,
    /// Candidates that failed validation and were dropped.
    pub skipped: usize,
}

/// The obligation state machine. Holds the store seams; all policy lives in
/// the pure `escalation`/`recurrence`/`preparation` modules.
pub struct LifecycleManager {
    obligations: Arc<dyn ObligationStore>,
    reminders: Arc<dyn ReminderStore>,
    tasks: Arc<dyn TaskStore>,
}

impl LifecycleManager {
    pub fn new(
        obligations: Arc<dyn ObligationStore>,
        reminders: Arc<dyn ReminderStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            obligations,
            reminders,
            tasks,
        }
    }

    /// Create an obligation and generate its preparation items: category
    /// checklist tasks when the deadline is far enough out, and the
    /// escalation reminder set always (near-term obligations may legitimately
    /// get an empty set — past lead times are never back-filled).
    pub async fn create(&self, owner_id: &str, draft: &ObligationDraft) -> Result<CreatedObligation> {
        draft.validate()?;
        let obligation = self
            .obligations
            .create_obligation(owner_id, draft, ObligationStatus::Active)
            .await?;

        let days = days_until(obligation.due_date, Utc::now());

        let task_drafts = preparation::preparation_tasks(&obligation, days);
        let preparation_tasks = if task_drafts.is_empty() {
            Vec::new()
        } else {
            self.tasks.create_tasks(owner_id, &task_drafts).await?
        };

        let reminder_drafts = escalation::creation_reminders(&obligation, days);
        let reminders = if reminder_drafts.is_empty() {
            Vec::new()
        } else {
            self.reminders
                .create_reminders(owner_id, &reminder_drafts)
                .await?
        };

        tracing::info!(
            "📋 Obligation created: '{}' ({}) — {} prep task(s), {} reminder(s)",
            obligation.title,
            obligation.id,
            preparation_tasks.len(),
            reminders.len()
        );

        Ok(CreatedObligation {
            obligation,
            preparation_tasks,
            reminders,
        })
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Obligation> {
        self.obligations.get_obligation(owner_id, id).await
    }

    pub async fn list(&self, owner_id: &str, filter: &ObligationFilter) -> Result<Vec<Obligation>> {
        self.obligations.list_obligations(owner_id, filter).await
    }

    /// Field-level update. Deliberately does NOT regenerate preparation items
    /// or reminders — those were frozen at creation time.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        changes: &ObligationChanges,
    ) -> Result<Obligation> {
        self.obligations
            .update_obligation(owner_id, id, changes)
            .await
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        self.obligations.delete_obligation(owner_id, id).await
    }

    /// Complete an obligation. Works from `active` and `overdue`; completing
    /// an already-completed obligation is a no-op returning the stored row,
    /// so a double complete can never spawn two successors. For recurring
    /// obligations the next cycle is created immediately — the only
    /// transition that spawns a new entity.
    pub async fn complete(&self, owner_id: &str, id: &str) -> Result<Obligation> {
        let existing = self.obligations.get_obligation(owner_id, id).await?;
        if existing.status == ObligationStatus::Completed {
            tracing::debug!("Obligation {} already completed — skipping", id);
            return Ok(existing);
        }

        let now = Utc::now();
        let updated = self
            .obligations
            .update_obligation(owner_id, id, &ObligationChanges::completed_at(now))
            .await?;

        if let Some(next) = recurrence::next_cycle(&existing) {
            let created = self.create(owner_id, &next).await?;
            tracing::info!(
                "🔁 Recurrence: '{}' → next cycle due {}",
                existing.title,
                created.obligation.due_date
            );
        }

        Ok(updated)
    }

    /// Obligations requiring immediate attention: active and either due
    /// within the next 24 hours or high-risk regardless of due date.
    pub async fn urgent(&self, owner_id: &str) -> Result<Vec<Obligation>> {
        let cutoff = Utc::now() + Duration::hours(24);
        let active = self
            .obligations
            .list_obligations(owner_id, &ObligationFilter::status(ObligationStatus::Active))
            .await?;
        Ok(active
            .into_iter()
            .filter(|o| o.due_date < cutoff || o.risk_level == RiskLevel::High)
            .collect())
    }

    /// Owner-scoped statistics.
    pub async fn stats(&self, owner_id: &str) -> Result<ObligationStats> {
        let now = Utc::now();
        let all = self
            .obligations
            .list_obligations(owner_id, &ObligationFilter::default())
            .await?;

        let mut stats = ObligationStats {
            total: all.len(),
            ..ObligationStats::default()
        };
        for o in &all {
            match o.status {
                ObligationStatus::Active => stats.active += 1,
                ObligationStatus::Completed => stats.completed += 1,
                ObligationStatus::Overdue => stats.overdue += 1,
            }
            if o.risk_level == RiskLevel::High {
                stats.high_risk += 1;
            }
            if o.status == ObligationStatus::Active && days_until(o.due_date, now) <= 7 {
                stats.due_soon += 1;
            }
        }
        Ok(stats)
    }

    /// Overdue-detection sweep: one administrative scan for active
    /// obligations past their due date, one batch status flip. Returns the
    /// newly overdue rows. Re-run-safe — rows already flipped are excluded
    /// by the active-only filter.
    pub async fn check_overdue(&self) -> Result<Vec<Obligation>> {
        let now = Utc::now();
        let filter = ObligationFilter {
            status: Some(ObligationStatus::Active),
            due_before: Some(now),
            ..ObligationFilter::default()
        };
        let newly_overdue = self.obligations.scan_obligations(&filter).await?;
        if newly_overdue.is_empty() {
            return Ok(newly_overdue);
        }

        let ids: Vec<String> = newly_overdue.iter().map(|o| o.id.clone()).collect();
        self.obligations.mark_overdue(&ids, now).await?;
        tracing::info!("⏰ Overdue sweep: {} obligation(s) flipped", ids.len());
        Ok(newly_overdue)
    }

    /// Persist an extracted plan. Every candidate passes the same validation
    /// as manual entry; invalid candidates are dropped and counted, never
    /// persisted.
    pub async fn accept_plan(&self, owner_id: &str, plan: &ExtractedPlan) -> Result<PlanOutcome> {
        let mut outcome = PlanOutcome::default();

        for draft in &plan.obligations {
            match self.create(owner_id, draft).await {
                Ok(created) => {
                    outcome.obligations_created += 1;
                    outcome.tasks_created += created.preparation_tasks.len();
                    outcome.reminders_created += created.reminders.len();
                }
                Err(e) if matches!(e, lifeclaw_core::LifeClawError::Validation(_)) => {
                    tracing::warn!("⚠️ Skipping extracted obligation: {e}");
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let valid_tasks: Vec<_> = plan
            .tasks
            .iter()
            .filter(|t| {
                let ok = !t.title.trim().is_empty();
                if !ok {
                    outcome.skipped += 1;
                }
                ok
            })
            .cloned()
            .collect();
        if !valid_tasks.is_empty() {
            outcome.tasks_created += self
                .tasks
                .create_tasks(owner_id, &valid_tasks)
                .await?
                .len();
        }

        let valid_reminders: Vec<_> = plan
            .reminders
            .iter()
            .filter(|r| {
                let ok = !r.title.trim().is_empty();
                if !ok {
                    outcome.skipped += 1;
                }
                ok
            })
            .cloned()
            .collect();
        if !valid_reminders.is_empty() {
            outcome.reminders_created += self
                .reminders
                .create_reminders(owner_id, &valid_reminders)
                .await?
                .len();
        }

        Ok(outcome)
    }

    /// Store handles for collaborators that share the same seams.
    pub fn reminder_store(&self) -> Arc<dyn ReminderStore> {
        self.reminders.clone()
    }

    pub fn obligation_store(&self) -> Arc<dyn ObligationStore> {
        self.obligations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeclaw_core::types::{Category, Frequency, ObligationKind, ReminderDraft, TaskDraft};
    use lifeclaw_store::SqliteStore;

    fn manager() -> LifecycleManager {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        LifecycleManager::new(store.clone(), store.clone(), store)
    }

    fn passport_draft(days_out: i64, risk: RiskLevel) -> ObligationDraft {
        ObligationDraft {
            title: "Renew Passport".into(),
            category: Category::Personal,
            kind: ObligationKind::OneTime,
            due_date: Utc::now() + Duration::days(days_out),
            frequency: None,
            risk_level: Some(risk),
            consequence: Some("cannot travel".into()),
        }
    }

    #[tokio::test]
    async fn test_create_high_risk_ten_days_out() {
        let m = manager();
        let created = m.create("u1", &passport_draft(10, RiskLevel::High)).await.unwrap();

        // 14-day lead already past: 7/3/1 realized
        assert_eq!(created.reminders.len(), 3);
        // Personal category has no preparation template
        assert!(created.preparation_tasks.is_empty());
        assert_eq!(created.obligation.status, ObligationStatus::Active);
    }

    #[tokio::test]
    async fn test_lead_time_skip_near_deadline() {
        let m = manager();
        let created = m.create("u1", &passport_draft(2, RiskLevel::High)).await.unwrap();
        assert_eq!(created.reminders.len(), 1);
        assert!(created.reminders[0].description.contains("due in 1 day."));
    }

    #[tokio::test]
    async fn test_create_finance_generates_prep_tasks() {
        let m = manager();
        let mut draft = passport_draft(10, RiskLevel::Medium);
        draft.title = "File VAT return".into();
        draft.category = Category::Finance;

        let created = m.create("u1", &draft).await.unwrap();
        assert_eq!(created.preparation_tasks.len(), 1);
        assert!(created.preparation_tasks[0].title.contains("File VAT return"));
    }

    #[tokio::test]
    async fn test_invalid_draft_rejected_before_store() {
        let m = manager();
        let mut draft = passport_draft(10, RiskLevel::Medium);
        draft.kind = ObligationKind::Recurring; // no frequency
        assert!(m.create("u1", &draft).await.is_err());
        assert!(
            m.list("u1", &ObligationFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_complete_spawns_single_successor() {
        let m = manager();
        let mut draft = passport_draft(1, RiskLevel::Medium);
        draft.kind = ObligationKind::Recurring;
        draft.frequency = Some(Frequency::Monthly);

        let created = m.create("u1", &draft).await.unwrap();
        let id = created.obligation.id.clone();

        let completed = m.complete("u1", &id).await.unwrap();
        assert_eq!(completed.status, ObligationStatus::Completed);
        assert!(completed.last_completed_at.is_some());

        let active = m
            .list("u1", &ObligationFilter::status(ObligationStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(
            active[0].due_date,
            recurrence::advance(created.obligation.due_date, Frequency::Monthly)
        );

        // Second completion of the same row: no second successor
        let again = m.complete("u1", &id).await.unwrap();
        assert_eq!(again.status, ObligationStatus::Completed);
        let active = m
            .list("u1", &ObligationFilter::status(ObligationStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_one_time_spawns_nothing() {
        let m = manager();
        let created = m.create("u1", &passport_draft(5, RiskLevel::Low)).await.unwrap();
        m.complete("u1", &created.obligation.id).await.unwrap();
        assert!(
            m.list("u1", &ObligationFilter::status(ObligationStatus::Active))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_overdue_sweep_idempotent() {
        let m = manager();
        let created = m.create("u1", &passport_draft(-1, RiskLevel::High)).await.unwrap();

        let first = m.check_overdue().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, created.obligation.id);

        // Same store state: second run finds nothing to flip
        let second = m.check_overdue().await.unwrap();
        assert!(second.is_empty());

        let o = m.get("u1", &created.obligation.id).await.unwrap();
        assert_eq!(o.status, ObligationStatus::Overdue);
    }

    #[tokio::test]
    async fn test_complete_from_overdue() {
        let m = manager();
        let created = m.create("u1", &passport_draft(-2, RiskLevel::Medium)).await.unwrap();
        m.check_overdue().await.unwrap();

        let completed = m.complete("u1", &created.obligation.id).await.unwrap();
        assert_eq!(completed.status, ObligationStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_does_not_regenerate_reminders() {
        let m = manager();
        let created = m.create("u1", &passport_draft(10, RiskLevel::High)).await.unwrap();
        assert_eq!(created.reminders.len(), 3);

        let changes = ObligationChanges {
            title: Some("Renew Passport (urgent)".into()),
            ..ObligationChanges::default()
        };
        m.update("u1", &created.obligation.id, &changes).await.unwrap();

        let reminders = m
            .reminder_store()
            .list_reminders("u1", true, None, None)
            .await
            .unwrap();
        assert_eq!(reminders.len(), 3);
    }

    #[tokio::test]
    async fn test_stats() {
        let m = manager();
        m.create("u1", &passport_draft(2, RiskLevel::High)).await.unwrap();
        m.create("u1", &passport_draft(30, RiskLevel::Low)).await.unwrap();
        let done = m.create("u1", &passport_draft(5, RiskLevel::Medium)).await.unwrap();
        m.complete("u1", &done.obligation.id).await.unwrap();

        let stats = m.stats("u1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.high_risk, 1);
        assert_eq!(stats.due_soon, 1);
    }

    #[tokio::test]
    async fn test_urgent_includes_high_risk_and_near_due() {
        let m = manager();
        let mut near = passport_draft(0, RiskLevel::Low);
        near.due_date = Utc::now() + Duration::hours(6);
        near.title = "Pick up prescription".into();
        m.create("u1", &near).await.unwrap();
        m.create("u1", &passport_draft(60, RiskLevel::High)).await.unwrap();
        m.create("u1", &passport_draft(10, RiskLevel::Low)).await.unwrap();

        let urgent = m.urgent("u1").await.unwrap();
        assert_eq!(urgent.len(), 2);
    }

    #[tokio::test]
    async fn test_accept_plan_validates_candidates() {
        let m = manager();
        let plan = ExtractedPlan {
            obligations: vec![
                passport_draft(10, RiskLevel::Medium),
                ObligationDraft {
                    title: "".into(), // invalid
                    ..passport_draft(10, RiskLevel::Medium)
                },
            ],
            tasks: vec![TaskDraft {
                title: "Book appointment".into(),
                description: String::new(),
                priority: None,
                ai_generated: true,
            }],
            reminders: vec![ReminderDraft {
                title: "   ".into(), // invalid
                description: String::new(),
                remind_at: Utc::now(),
                ai_generated: true,
            }],
        };

        let outcome = m.accept_plan("u1", &plan).await.unwrap();
        assert_eq!(outcome.obligations_created, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.tasks_created, 1);
        assert_eq!(outcome.reminders_created, 3); // from the one valid obligation
    }
}
