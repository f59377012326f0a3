//! Scheduler engine — three named jobs, one tick loop.
//!
//! Uses tokio::interval for zero-overhead ticking (sleeps between checks).
//! The schedule is explicit state owned by this component: every job carries
//! its cron expression, next/last run, and run count, and the loop has a
//! start/stop lifecycle instead of ambient timers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use lifeclaw_core::config::SchedulerConfig;

use crate::cron;
use crate::sweeps::SweepRunner;

/// Which sweep a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Deadline,
    Urgent,
    Renewal,
}

/// One named recurring job.
#[derive(Debug, Clone)]
pub struct SweepJob {
    pub name: &'static str,
    pub kind: SweepKind,
    pub expression: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u32,
    pub last_error: Option<String>,
}

/// Serializable job snapshot for the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub name: &'static str,
    pub kind: SweepKind,
    pub expression: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u32,
    pub last_error: Option<String>,
}

/// The scheduler engine — owns the jobs and triggers them when due.
pub struct SweepScheduler {
    jobs: Vec<SweepJob>,
    runner: Arc<SweepRunner>,
}

impl SweepScheduler {
    pub fn new(config: &SchedulerConfig, runner: Arc<SweepRunner>) -> Self {
        let now = Utc::now();
        let job = |name, kind, expression: &str| SweepJob {
            name,
            kind,
            expression: expression.to_string(),
            next_run: cron::next_run_after(expression, now),
            last_run: None,
            run_count: 0,
            last_error: None,
        };
        Self {
            jobs: vec![
                job("deadline-sweep", SweepKind::Deadline, &config.deadline_cron),
                job("urgent-sweep", SweepKind::Urgent, &config.urgent_cron),
                job("renewal-sweep", SweepKind::Renewal, &config.renewal_cron),
            ],
            runner,
        }
    }

    /// Snapshot of all jobs.
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.jobs
            .iter()
            .map(|j| JobInfo {
                name: j.name,
                kind: j.kind,
                expression: j.expression.clone(),
                next_run: j.next_run,
                last_run: j.last_run,
                run_count: j.run_count,
                last_error: j.last_error.clone(),
            })
            .collect()
    }

    /// Check and run due jobs. Returns how many fired. Each job fails
    /// independently — an error is recorded on the job and never blocks the
    /// other two, and the next occurrence is always scheduled.
    pub async fn tick(&mut self) -> usize {
        let now = Utc::now();
        let mut fired = 0;

        for i in 0..self.jobs.len() {
            let due = matches!(self.jobs[i].next_run, Some(next) if next <= now);
            if !due {
                continue;
            }

            let (name, kind) = (self.jobs[i].name, self.jobs[i].kind);
            tracing::info!("🔔 Sweep job triggered: '{name}'");
            let outcome = self.run_job(kind).await;

            let job = &mut self.jobs[i];
            job.last_run = Some(now);
            job.run_count += 1;
            job.next_run = cron::next_run_after(&job.expression, now);
            job.last_error = match outcome {
                Ok(summary) => {
                    tracing::info!("📣 [{name}] {summary}");
                    None
                }
                Err(e) => {
                    tracing::error!("❌ [{name}] tick failed: {e}");
                    Some(e)
                }
            };
            fired += 1;
        }

        fired
    }

    async fn run_job(&self, kind: SweepKind) -> Result<String, String> {
        match kind {
            SweepKind::Deadline => self
                .runner
                .deadline_sweep()
                .await
                .map(|r| {
                    format!(
                        "{} overdue, {} escalated, {} notified",
                        r.overdue_count, r.escalated_count, r.notified_count
                    )
                })
                .map_err(|e| e.to_string()),
            SweepKind::Urgent => self
                .runner
                .urgent_sweep()
                .await
                .map(|r| format!("{} urgent, {} reminded", r.urgent_count, r.reminded_count))
                .map_err(|e| e.to_string()),
            SweepKind::Renewal => self
                .runner
                .renewal_sweep()
                .await
                .map(|r| format!("{} renewed", r.renewed_count))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Handle for a running scheduler loop. Dropping it does NOT stop the loop —
/// call `stop()`.
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to exit and wait for it. Any in-flight sweep is
    /// abandoned at the next await point; the next start re-scans safely.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.handle.await;
        tracing::info!("⏹ Scheduler stopped");
    }
}

/// Start the scheduler loop as a background tokio task.
pub fn start(
    scheduler: Arc<Mutex<SweepScheduler>>,
    check_interval_secs: u64,
) -> SchedulerHandle {
    tracing::info!("⏰ Scheduler started (check every {check_interval_secs}s)");
    let shutdown = Arc::new(Notify::new());
    let shutdown_rx = shutdown.clone();

    let handle = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(check_interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let mut engine = scheduler.lock().await;
                    engine.tick().await;
                }
                _ = shutdown_rx.notified() => break,
            }
        }
    });

    SchedulerHandle { shutdown, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeclaw_lifecycle::LifecycleManager;
    use lifeclaw_notify::{Dispatcher, HttpPushTransport};
    use lifeclaw_store::SqliteStore;

    fn scheduler() -> SweepScheduler {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let manager = Arc::new(LifecycleManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let transport = Arc::new(HttpPushTransport::new(&Default::default()));
        let dispatcher = Arc::new(Dispatcher::new(store, transport));
        SweepScheduler::new(
            &SchedulerConfig::default(),
            Arc::new(SweepRunner::new(manager, dispatcher)),
        )
    }

    #[test]
    fn test_jobs_initialized_with_next_runs() {
        let engine = scheduler();
        let jobs = engine.jobs();
        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|j| j.next_run.is_some()));
        assert!(jobs.iter().any(|j| j.name == "deadline-sweep"));
        assert!(jobs.iter().any(|j| j.name == "urgent-sweep"));
        assert!(jobs.iter().any(|j| j.name == "renewal-sweep"));
    }

    #[tokio::test]
    async fn test_tick_skips_jobs_not_yet_due() {
        let mut engine = scheduler();
        // Fresh schedule: every next_run is in the future
        assert_eq!(engine.tick().await, 0);
    }

    #[tokio::test]
    async fn test_tick_runs_due_job_and_reschedules() {
        let mut engine = scheduler();
        engine.jobs[0].next_run = Some(Utc::now() - chrono::Duration::minutes(1));

        assert_eq!(engine.tick().await, 1);
        let job = &engine.jobs[0];
        assert_eq!(job.run_count, 1);
        assert!(job.last_run.is_some());
        assert!(job.last_error.is_none());
        assert!(matches!(job.next_run, Some(next) if next > Utc::now()));

        // Rescheduled into the future: a second tick is a no-op
        assert_eq!(engine.tick().await, 0);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let engine = Arc::new(Mutex::new(scheduler()));
        let handle = start(engine.clone(), 3600);
        // The loop is alive and holds the engine only during ticks
        assert_eq!(engine.lock().await.jobs().len(), 3);
        handle.stop().await;
    }
}
