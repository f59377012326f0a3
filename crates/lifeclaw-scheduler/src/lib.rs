//! # LifeClaw Scheduler
//!
//! Three named recurring jobs with an explicit start/stop lifecycle — no
//! ambient background timers:
//!
//! ```text
//! SweepScheduler (tokio interval tick)
//!   ├── deadline-sweep  "0 9 * * *" → flip overdue, escalate high-risk, push
//!   ├── urgent-sweep    "0 * * * *" → hour-denominated reminders (≤ 24h out)
//!   └── renewal-sweep   "0 8 * * *" → regenerate completed recurring cycles
//! ```
//!
//! Every job is safe under at-least-once execution: re-running a window never
//! duplicates reminders or recurrences. A failing unit (one owner, one
//! obligation) never aborts the rest of its batch; a failing job never blocks
//! the other two.

pub mod cron;
pub mod engine;
pub mod sweeps;

pub use engine::{JobInfo, SchedulerHandle, SweepScheduler};
pub use sweeps::{DeadlineSweepReport, RenewalSweepReport, SweepRunner, UrgentSweepReport};
