//! Record store contracts.
//!
//! All operations are keyed by (owner id, entity id) and idempotent per row.
//! Owner-scoped listing is the normal query path; the `scan_*` methods are an
//! explicit administrative capability used only by the periodic sweeps —
//! sweeps never pass a wildcard owner through the normal path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    Obligation, ObligationChanges, ObligationDraft, ObligationFilter, ObligationStatus, PrepTask,
    PushSubscription, Reminder, ReminderDraft, TaskDraft,
};

/// CRUD + filtered list over obligations.
#[async_trait]
pub trait ObligationStore: Send + Sync {
    async fn create_obligation(
        &self,
        owner_id: &str,
        draft: &ObligationDraft,
        status: ObligationStatus,
    ) -> Result<Obligation>;

    /// Fails with `NotFound` for unknown ids or ids owned by someone else.
    async fn get_obligation(&self, owner_id: &str, id: &str) -> Result<Obligation>;

    async fn update_obligation(
        &self,
        owner_id: &str,
        id: &str,
        changes: &ObligationChanges,
    ) -> Result<Obligation>;

    async fn delete_obligation(&self, owner_id: &str, id: &str) -> Result<()>;

    /// Owner-scoped list, ordered by due date ascending.
    async fn list_obligations(
        &self,
        owner_id: &str,
        filter: &ObligationFilter,
    ) -> Result<Vec<Obligation>>;

    /// Administrative scan across all owners. Sweeps only.
    async fn scan_obligations(&self, filter: &ObligationFilter) -> Result<Vec<Obligation>>;

    /// Batch status flip to overdue. Re-running on already-flipped rows is a
    /// no-op because callers select only active rows.
    async fn mark_overdue(&self, ids: &[String], now: DateTime<Utc>) -> Result<()>;
}

/// Reminder persistence: batch create plus the deactivation-based retirement
/// path. The scheduler never mutates a reminder after creation except to
/// deactivate it.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn create_reminders(
        &self,
        owner_id: &str,
        drafts: &[ReminderDraft],
    ) -> Result<Vec<Reminder>>;

    async fn get_reminder(&self, owner_id: &str, id: &str) -> Result<Reminder>;

    async fn list_reminders(
        &self,
        owner_id: &str,
        active_only: bool,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Reminder>>;

    /// Does an active reminder with exactly this title exist? Window-dedupe
    /// check for the urgent sweep.
    async fn has_active_reminder(&self, owner_id: &str, title: &str) -> Result<bool>;

    /// Move the fire time (snooze).
    async fn set_reminder_time(
        &self,
        owner_id: &str,
        id: &str,
        remind_at: DateTime<Utc>,
    ) -> Result<Reminder>;

    async fn deactivate_reminder(&self, owner_id: &str, id: &str) -> Result<Reminder>;
}

/// Preparation-task batch-create service.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_tasks(&self, owner_id: &str, drafts: &[TaskDraft]) -> Result<Vec<PrepTask>>;

    async fn list_tasks(
        &self,
        owner_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<PrepTask>>;
}

/// Push subscription storage — one destination per owner, newest wins.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn upsert_subscription(
        &self,
        owner_id: &str,
        destination: &serde_json::Value,
    ) -> Result<()>;

    async fn get_subscription(&self, owner_id: &str) -> Result<Option<PushSubscription>>;

    async fn delete_subscription(&self, owner_id: &str) -> Result<()>;
}
