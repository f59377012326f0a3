//! The three sweep bodies. Each processes per-owner (or per-obligation)
//! units as independent futures joined without short-circuiting: a slow or
//! failed unit never delays or aborts the others. Only a top-level store
//! failure fails the tick — safe, because every mutation is an idempotent
//! single-row operation and the next tick re-scans.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use serde::Serialize;

use lifeclaw_core::error::Result;
use lifeclaw_core::time::hours_until;
use lifeclaw_core::traits::{ObligationStore, ReminderStore};
use lifeclaw_core::types::{
    Obligation, ObligationFilter, ObligationKind, ObligationStatus, ReminderDraft, RiskLevel,
};
use lifeclaw_lifecycle::{LifecycleManager, escalation, recurrence};
use lifeclaw_notify::{DeliveryStatus, Dispatcher};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct DeadlineSweepReport {
    pub overdue_count: usize,
    pub escalated_count: usize,
    pub notified_count: usize,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct UrgentSweepReport {
    pub urgent_count: usize,
    pub reminded_count: usize,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RenewalSweepReport {
    pub renewed_count: usize,
}

/// Executes the sweep bodies on behalf of the scheduler (and of the gateway's
/// on-demand sweep endpoints).
pub struct SweepRunner {
    manager: Arc<LifecycleManager>,
    obligations: Arc<dyn ObligationStore>,
    reminders: Arc<dyn ReminderStore>,
    dispatcher: Arc<Dispatcher>,
}

fn group_by_owner(obligations: Vec<Obligation>) -> HashMap<String, Vec<Obligation>> {
    let mut grouped: HashMap<String, Vec<Obligation>> = HashMap::new();
    for obligation in obligations {
        grouped
            .entry(obligation.owner_id.clone())
            .or_default()
            .push(obligation);
    }
    grouped
}

impl SweepRunner {
    pub fn new(manager: Arc<LifecycleManager>, dispatcher: Arc<Dispatcher>) -> Self {
        let obligations = manager.obligation_store();
        let reminders = manager.reminder_store();
        Self {
            manager,
            obligations,
            reminders,
            dispatcher,
        }
    }

    /// Daily deadline sweep: flip everything past due to overdue, then
    /// escalate each newly overdue high-risk obligation — one immediate
    /// reminder persisted and one push delivered, grouped per owner.
    pub async fn deadline_sweep(&self) -> Result<DeadlineSweepReport> {
        let newly_overdue = self.manager.check_overdue().await?;
        let overdue_count = newly_overdue.len();
        let now = Utc::now();

        let units = group_by_owner(newly_overdue)
            .into_iter()
            .map(|(owner_id, obligations)| async move {
                let high_risk: Vec<&Obligation> = obligations
                    .iter()
                    .filter(|o| o.risk_level == RiskLevel::High)
                    .collect();
                if high_risk.is_empty() {
                    return (0usize, 0usize);
                }

                let drafts: Vec<ReminderDraft> = high_risk
                    .iter()
                    .map(|o| escalation::overdue_alert(o, now))
                    .collect();
                let escalated = match self.reminders.create_reminders(&owner_id, &drafts).await {
                    Ok(created) => created.len(),
                    Err(e) => {
                        tracing::warn!("⚠️ Escalation reminders for {owner_id} failed: {e}");
                        return (0, 0);
                    }
                };

                let mut notified = 0;
                for obligation in &high_risk {
                    match self
                        .dispatcher
                        .deliver(&owner_id, &escalation::overdue_push(obligation, now))
                        .await
                    {
                        Ok(DeliveryStatus::Delivered) => notified += 1,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("⚠️ Overdue push for {owner_id} failed: {e}");
                        }
                    }
                }
                (escalated, notified)
            });

        let mut report = DeadlineSweepReport {
            overdue_count,
            ..DeadlineSweepReport::default()
        };
        for (escalated, notified) in join_all(units).await {
            report.escalated_count += escalated;
            report.notified_count += notified;
        }

        tracing::info!(
            "⏰ Deadline sweep: {} overdue, {} escalated, {} notified",
            report.overdue_count,
            report.escalated_count,
            report.notified_count
        );
        Ok(report)
    }

    /// Hourly urgent sweep: every active obligation due within the next 24
    /// hours gets an hour-denominated reminder. Window-idempotent — an
    /// identical active reminder title suppresses re-creation, so re-running
    /// within the same hour is a no-op while the next hour (with a smaller
    /// hour count) still fires.
    pub async fn urgent_sweep(&self) -> Result<UrgentSweepReport> {
        let active = self
            .obligations
            .scan_obligations(&ObligationFilter::status(ObligationStatus::Active))
            .await?;
        let now = Utc::now();
        let cutoff = now + Duration::hours(24);

        let units = group_by_owner(active)
            .into_iter()
            .map(|(owner_id, obligations)| async move {
                let urgent: Vec<Obligation> = obligations
                    .into_iter()
                    .filter(|o| {
                        (o.due_date <= cutoff && o.due_date > now)
                            || o.risk_level == RiskLevel::High
                    })
                    .collect();
                let urgent_count = urgent.len();

                let mut drafts = Vec::new();
                for obligation in &urgent {
                    let hours = hours_until(obligation.due_date, now);
                    if !(1..=24).contains(&hours) {
                        continue;
                    }
                    let draft = escalation::urgent_alert(obligation, hours, now);
                    match self.reminders.has_active_reminder(&owner_id, &draft.title).await {
                        Ok(true) => {} // already reminded this window
                        Ok(false) => drafts.push(draft),
                        Err(e) => {
                            tracing::warn!("⚠️ Urgent dedupe check for {owner_id} failed: {e}");
                        }
                    }
                }

                let reminded = if drafts.is_empty() {
                    0
                } else {
                    match self.reminders.create_reminders(&owner_id, &drafts).await {
                        Ok(created) => created.len(),
                        Err(e) => {
                            tracing::warn!("⚠️ Urgent reminders for {owner_id} failed: {e}");
                            0
                        }
                    }
                };
                (urgent_count, reminded)
            });

        let mut report = UrgentSweepReport::default();
        for (urgent, reminded) in join_all(units).await {
            report.urgent_count += urgent;
            report.reminded_count += reminded;
        }

        tracing::info!(
            "🔔 Urgent sweep: {} urgent, {} reminded",
            report.urgent_count,
            report.reminded_count
        );
        Ok(report)
    }

    /// Daily renewal sweep: completed recurring obligations whose period has
    /// elapsed since last completion get their next cycle — unless an active
    /// successor (same owner, same title, same next due date) already exists.
    pub async fn renewal_sweep(&self) -> Result<RenewalSweepReport> {
        let filter = ObligationFilter {
            status: Some(ObligationStatus::Completed),
            kind: Some(ObligationKind::Recurring),
            ..ObligationFilter::default()
        };
        let completed = self.obligations.scan_obligations(&filter).await?;
        let now = Utc::now();

        let units = completed.into_iter().map(|obligation| async move {
            if !recurrence::renewal_due(&obligation, now) {
                return 0usize;
            }
            let Some(draft) = recurrence::next_cycle(&obligation) else {
                return 0;
            };

            let active = match self
                .obligations
                .list_obligations(
                    &obligation.owner_id,
                    &ObligationFilter::status(ObligationStatus::Active),
                )
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Renewal dedupe scan for {} failed: {e}",
                        obligation.owner_id
                    );
                    return 0;
                }
            };
            let successor_exists = active.iter().any(|a| {
                a.title == obligation.title
                    && a.due_date.date_naive() == draft.due_date.date_naive()
            });
            if successor_exists {
                return 0;
            }

            match self.manager.create(&obligation.owner_id, &draft).await {
                Ok(created) => {
                    tracing::info!(
                        "🔁 Renewed '{}' — next cycle due {}",
                        created.obligation.title,
                        created.obligation.due_date
                    );
                    1
                }
                Err(e) => {
                    tracing::warn!("⚠️ Renewal of '{}' failed: {e}", obligation.title);
                    0
                }
            }
        });

        let renewed_count: usize = join_all(units).await.into_iter().sum();
        tracing::info!("🔁 Renewal sweep: {} renewed", renewed_count);
        Ok(RenewalSweepReport { renewed_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lifeclaw_core::error::PushError;
    use lifeclaw_core::traits::{PushTransport, SubscriptionStore};
    use lifeclaw_core::types::{
        Category, Frequency, ObligationChanges, ObligationDraft, PushMessage,
    };
    use lifeclaw_store::SqliteStore;
    use std::sync::Mutex;

    struct RecordingTransport {
        sent: Mutex<Vec<PushMessage>>,
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn send(
            &self,
            _destination: &serde_json::Value,
            message: &PushMessage,
        ) -> std::result::Result<(), PushError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<SqliteStore>,
        manager: Arc<LifecycleManager>,
        runner: SweepRunner,
        transport: Arc<RecordingTransport>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let manager = Arc::new(LifecycleManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let dispatcher = Arc::new(Dispatcher::new(store.clone(), transport.clone()));
        let runner = SweepRunner::new(manager.clone(), dispatcher);
        Fixture {
            store,
            manager,
            runner,
            transport,
        }
    }

    fn passport(days_out: i64, risk: RiskLevel) -> ObligationDraft {
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
    async fn test_deadline_sweep_end_to_end() {
        let f = fixture();
        f.store
            .upsert_subscription("u1", &serde_json::json!({"endpoint": "https://push.example"}))
            .await
            .unwrap();

        // Create 10 days out (3 reminders generated), then slide the due
        // date 47h into the past to simulate elapsed time (rounds up to 2
        // days overdue).
        let created = f.manager.create("u1", &passport(10, RiskLevel::High)).await.unwrap();
        assert_eq!(created.reminders.len(), 3);
        f.manager
            .update(
                "u1",
                &created.obligation.id,
                &ObligationChanges {
                    due_date: Some(Utc::now() - Duration::hours(47)),
                    ..ObligationChanges::default()
                },
            )
            .await
            .unwrap();

        let report = f.runner.deadline_sweep().await.unwrap();
        assert_eq!(report.overdue_count, 1);
        assert_eq!(report.escalated_count, 1);
        assert_eq!(report.notified_count, 1);

        let sent = f.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("2 days overdue"));
        drop(sent);

        // Status flipped; 3 creation reminders + 1 escalation
        let o = f.manager.get("u1", &created.obligation.id).await.unwrap();
        assert_eq!(o.status, ObligationStatus::Overdue);
        let reminders = f.store.list_reminders("u1", true, None, None).await.unwrap();
        assert_eq!(reminders.len(), 4);

        // Idempotence: the row is no longer active, so nothing re-fires
        let again = f.runner.deadline_sweep().await.unwrap();
        assert_eq!(again.overdue_count, 0);
        assert_eq!(again.escalated_count, 0);
        assert_eq!(f.transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_sweep_ignores_low_risk() {
        let f = fixture();
        let created = f.manager.create("u1", &passport(5, RiskLevel::Low)).await.unwrap();
        f.manager
            .update(
                "u1",
                &created.obligation.id,
                &ObligationChanges {
                    due_date: Some(Utc::now() - Duration::hours(1)),
                    ..ObligationChanges::default()
                },
            )
            .await
            .unwrap();

        let report = f.runner.deadline_sweep().await.unwrap();
        assert_eq!(report.overdue_count, 1);
        assert_eq!(report.escalated_count, 0);
        assert!(f.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_urgent_sweep_window_idempotent() {
        let f = fixture();
        let mut draft = passport(0, RiskLevel::Medium);
        draft.due_date = Utc::now() + Duration::hours(5);
        f.manager.create("u1", &draft).await.unwrap();

        let report = f.runner.urgent_sweep().await.unwrap();
        assert_eq!(report.urgent_count, 1);
        assert_eq!(report.reminded_count, 1);

        let reminders = f.store.list_reminders("u1", true, None, None).await.unwrap();
        assert!(reminders.iter().any(|r| r.title.contains("due in 5 hours")));

        // Same window: identical title already active, nothing new
        let again = f.runner.urgent_sweep().await.unwrap();
        assert_eq!(again.urgent_count, 1);
        assert_eq!(again.reminded_count, 0);
    }

    #[tokio::test]
    async fn test_urgent_sweep_high_risk_far_out_counts_but_no_hour_reminder() {
        let f = fixture();
        f.manager.create("u1", &passport(30, RiskLevel::High)).await.unwrap();

        let report = f.runner.urgent_sweep().await.unwrap();
        // High risk is urgent regardless of due date, but only 0 < h ≤ 24
        // earns an hour-denominated reminder.
        assert_eq!(report.urgent_count, 1);
        assert_eq!(report.reminded_count, 0);
    }

    #[tokio::test]
    async fn test_renewal_sweep_dedupes_successor() {
        let f = fixture();
        let draft = ObligationDraft {
            title: "Pay rent".into(),
            category: Category::Finance,
            kind: ObligationKind::Recurring,
            due_date: Utc::now() - Duration::days(3),
            frequency: Some(Frequency::Daily),
            risk_level: Some(RiskLevel::Medium),
            consequence: None,
        };
        // Seed a completed recurring row whose period has long elapsed.
        let completed = f
            .store
            .create_obligation("u1", &draft, ObligationStatus::Completed)
            .await
            .unwrap();
        f.store
            .update_obligation(
                "u1",
                &completed.id,
                &ObligationChanges {
                    last_completed_at: Some(Utc::now() - Duration::days(2)),
                    ..ObligationChanges::default()
                },
            )
            .await
            .unwrap();

        let report = f.runner.renewal_sweep().await.unwrap();
        assert_eq!(report.renewed_count, 1);

        let active = f
            .store
            .list_obligations("u1", &ObligationFilter::status(ObligationStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Pay rent");

        // Re-run: successor already exists for the same next date
        let again = f.runner.renewal_sweep().await.unwrap();
        assert_eq!(again.renewed_count, 0);
        let active = f
            .store
            .list_obligations("u1", &ObligationFilter::status(ObligationStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_renewal_sweep_skips_fresh_completion() {
        let f = fixture();
        let draft = ObligationDraft {
            title: "Water plants".into(),
            category: Category::Personal,
            kind: ObligationKind::Recurring,
            due_date: Utc::now() + Duration::days(6),
            frequency: Some(Frequency::Weekly),
            risk_level: None,
            consequence: None,
        };
        let completed = f
            .store
            .create_obligation("u1", &draft, ObligationStatus::Completed)
            .await
            .unwrap();
        f.store
            .update_obligation(
                "u1",
                &completed.id,
                &ObligationChanges {
                    last_completed_at: Some(Utc::now() - Duration::days(1)),
                    ..ObligationChanges::default()
                },
            )
            .await
            .unwrap();

        // Completed yesterday on a weekly cadence: nothing to renew yet
        let report = f.runner.renewal_sweep().await.unwrap();
        assert_eq!(report.renewed_count, 0);
    }
}
