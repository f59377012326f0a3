//! SQLite store implementing every record-store trait.
//!
//! One connection behind a mutex. All timestamps are RFC 3339 text, all
//! enums are their snake_case strings. Rows are mapped leniently — an
//! unknown enum value degrades to a safe default instead of poisoning the
//! whole result set.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params, params_from_iter};

use lifeclaw_core::error::{LifeClawError, Result};
use lifeclaw_core::traits::{ObligationStore, ReminderStore, SubscriptionStore, TaskStore};
use lifeclaw_core::types::{
    Category, Frequency, Obligation, ObligationChanges, ObligationDraft, ObligationFilter,
    ObligationKind, ObligationStatus, PrepTask, PushSubscription, Reminder, ReminderDraft,
    RiskLevel, TaskDraft, TaskPriority, TaskStatus,
};

/// SQLite-backed store for obligations, reminders, preparation tasks, and
/// push subscriptions.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn store_err(e: impl std::fmt::Display) -> LifeClawError {
    LifeClawError::Store(e.to_string())
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_opt_ts(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        // WAL mode for concurrent reads during sweeps
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        tracing::debug!("💾 SQLite store ready at {}", path.display());
        Ok(store)
    }

    /// In-memory database — tests and one-shot CLI runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS obligations (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                consequence TEXT,
                due_date TEXT NOT NULL,
                kind TEXT NOT NULL,              -- 'one_time', 'recurring'
                frequency TEXT,                  -- set iff kind = 'recurring'
                risk_level TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'active',
                last_completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_obligations_owner
                ON obligations(owner_id, status);
            CREATE INDEX IF NOT EXISTS idx_obligations_due
                ON obligations(status, due_date);

            CREATE TABLE IF NOT EXISTS reminders (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                remind_at TEXT NOT NULL,
                ai_generated INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reminders_owner
                ON reminders(owner_id, active, remind_at);

            CREATE TABLE IF NOT EXISTS prep_tasks (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'pending',
                ai_generated INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_prep_tasks_owner
                ON prep_tasks(owner_id, status);

            CREATE TABLE IF NOT EXISTS push_subscriptions (
                owner_id TEXT PRIMARY KEY,
                destination TEXT NOT NULL,       -- opaque JSON transport payload
                created_at TEXT NOT NULL
            );
            ",
        )
        .map_err(store_err)?;
        Ok(())
    }

    fn row_to_obligation(row: &Row<'_>) -> rusqlite::Result<Obligation> {
        let category: String = row.get(3)?;
        let kind: String = row.get(6)?;
        let frequency: Option<String> = row.get(7)?;
        let risk: String = row.get(8)?;
        let status: String = row.get(9)?;
        let due: String = row.get(5)?;
        let last_completed: Option<String> = row.get(10)?;
        let created: String = row.get(11)?;
        let updated: String = row.get(12)?;

        Ok(Obligation {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            category: Category::parse(&category).unwrap_or(Category::Other),
            consequence: row.get(4)?,
            due_date: parse_ts(&due),
            kind: ObligationKind::parse(&kind).unwrap_or(ObligationKind::OneTime),
            frequency: frequency.as_deref().and_then(Frequency::parse),
            risk_level: RiskLevel::parse(&risk).unwrap_or_default(),
            status: ObligationStatus::parse(&status).unwrap_or(ObligationStatus::Active),
            last_completed_at: parse_opt_ts(last_completed),
            created_at: parse_ts(&created),
            updated_at: parse_ts(&updated),
        })
    }

    const OBLIGATION_COLS: &'static str = "id, owner_id, title, category, consequence, due_date, \
         kind, frequency, risk_level, status, last_completed_at, created_at, updated_at";

    /// Shared query builder for the owner-scoped and administrative paths.
    fn query_obligations(
        &self,
        owner_id: Option<&str>,
        filter: &ObligationFilter,
    ) -> Result<Vec<Obligation>> {
        let mut sql = format!(
            "SELECT {} FROM obligations WHERE 1=1",
            Self::OBLIGATION_COLS
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(owner) = owner_id {
            sql.push_str(" AND owner_id = ?");
            args.push(owner.to_string());
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(status.as_str().to_string());
        }
        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            args.push(category.as_str().to_string());
        }
        if let Some(kind) = filter.kind {
            sql.push_str(" AND kind = ?");
            args.push(kind.as_str().to_string());
        }
        if let Some(due_before) = filter.due_before {
            sql.push_str(" AND due_date < ?");
            args.push(due_before.to_rfc3339());
        }
        sql.push_str(" ORDER BY due_date ASC");
        if filter.limit.is_some() || filter.offset.is_some() {
            sql.push_str(&format!(
                " LIMIT {} OFFSET {}",
                filter.limit.map(i64::from).unwrap_or(-1),
                filter.offset.unwrap_or(0)
            ));
        }

        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), Self::row_to_obligation)
            .map_err(store_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn load_obligation(&self, owner_id: &str, id: &str) -> Result<Obligation> {
        let conn = self.conn.lock().map_err(store_err)?;
        let sql = format!(
            "SELECT {} FROM obligations WHERE id = ?1 AND owner_id = ?2",
            Self::OBLIGATION_COLS
        );
        conn.query_row(&sql, params![id, owner_id], Self::row_to_obligation)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    LifeClawError::NotFound(format!("obligation {id}"))
                }
                other => store_err(other),
            })
    }

    fn row_to_reminder(row: &Row<'_>) -> rusqlite::Result<Reminder> {
        let remind_at: String = row.get(4)?;
        let created: String = row.get(7)?;
        Ok(Reminder {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            remind_at: parse_ts(&remind_at),
            ai_generated: row.get::<_, i64>(5)? != 0,
            active: row.get::<_, i64>(6)? != 0,
            created_at: parse_ts(&created),
        })
    }

    const REMINDER_COLS: &'static str =
        "id, owner_id, title, description, remind_at, ai_generated, active, created_at";

    fn load_reminder(&self, owner_id: &str, id: &str) -> Result<Reminder> {
        let conn = self.conn.lock().map_err(store_err)?;
        let sql = format!(
            "SELECT {} FROM reminders WHERE id = ?1 AND owner_id = ?2",
            Self::REMINDER_COLS
        );
        conn.query_row(&sql, params![id, owner_id], Self::row_to_reminder)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    LifeClawError::NotFound(format!("reminder {id}"))
                }
                other => store_err(other),
            })
    }
}

#[async_trait]
impl ObligationStore for SqliteStore {
    async fn create_obligation(
        &self,
        owner_id: &str,
        draft: &ObligationDraft,
        status: ObligationStatus,
    ) -> Result<Obligation> {
        let now = Utc::now();
        let obligation = Obligation {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: draft.title.clone(),
            category: draft.category,
            consequence: draft.consequence.clone(),
            due_date: draft.due_date,
            kind: draft.kind,
            frequency: draft.frequency,
            risk_level: draft.risk(),
            status,
            last_completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(
            "INSERT INTO obligations
             (id, owner_id, title, category, consequence, due_date, kind, frequency,
              risk_level, status, last_completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                obligation.id,
                obligation.owner_id,
                obligation.title,
                obligation.category.as_str(),
                obligation.consequence,
                obligation.due_date.to_rfc3339(),
                obligation.kind.as_str(),
                obligation.frequency.map(|f| f.as_str()),
                obligation.risk_level.as_str(),
                obligation.status.as_str(),
                obligation.last_completed_at.map(|t| t.to_rfc3339()),
                obligation.created_at.to_rfc3339(),
                obligation.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(obligation)
    }

    async fn get_obligation(&self, owner_id: &str, id: &str) -> Result<Obligation> {
        self.load_obligation(owner_id, id)
    }

    async fn update_obligation(
        &self,
        owner_id: &str,
        id: &str,
        changes: &ObligationChanges,
    ) -> Result<Obligation> {
        let mut obligation = self.load_obligation(owner_id, id)?;
        if let Some(title) = &changes.title {
            obligation.title = title.clone();
        }
        if let Some(category) = changes.category {
            obligation.category = category;
        }
        if let Some(consequence) = &changes.consequence {
            obligation.consequence = Some(consequence.clone());
        }
        if let Some(due_date) = changes.due_date {
            obligation.due_date = due_date;
        }
        if let Some(risk) = changes.risk_level {
            obligation.risk_level = risk;
        }
        if let Some(status) = changes.status {
            obligation.status = status;
        }
        if let Some(at) = changes.last_completed_at {
            obligation.last_completed_at = Some(at);
        }
        obligation.updated_at = Utc::now();

        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(
            "UPDATE obligations SET title = ?1, category = ?2, consequence = ?3,
             due_date = ?4, risk_level = ?5, status = ?6, last_completed_at = ?7,
             updated_at = ?8 WHERE id = ?9 AND owner_id = ?10",
            params![
                obligation.title,
                obligation.category.as_str(),
                obligation.consequence,
                obligation.due_date.to_rfc3339(),
                obligation.risk_level.as_str(),
                obligation.status.as_str(),
                obligation.last_completed_at.map(|t| t.to_rfc3339()),
                obligation.updated_at.to_rfc3339(),
                id,
                owner_id,
            ],
        )
        .map_err(store_err)?;
        Ok(obligation)
    }

    async fn delete_obligation(&self, owner_id: &str, id: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        let affected = conn
            .execute(
                "DELETE FROM obligations WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(LifeClawError::NotFound(format!("obligation {id}")));
        }
        Ok(())
    }

    async fn list_obligations(
        &self,
        owner_id: &str,
        filter: &ObligationFilter,
    ) -> Result<Vec<Obligation>> {
        self.query_obligations(Some(owner_id), filter)
    }

    async fn scan_obligations(&self, filter: &ObligationFilter) -> Result<Vec<Obligation>> {
        self.query_obligations(None, filter)
    }

    async fn mark_overdue(&self, ids: &[String], now: DateTime<Utc>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE obligations SET status = 'overdue', updated_at = '{}'
             WHERE status = 'active' AND id IN ({placeholders})",
            now.to_rfc3339()
        );
        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(&sql, params_from_iter(ids.iter()))
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for SqliteStore {
    async fn create_reminders(
        &self,
        owner_id: &str,
        drafts: &[ReminderDraft],
    ) -> Result<Vec<Reminder>> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        let conn = self.conn.lock().map_err(store_err)?;
        for draft in drafts {
            let reminder = Reminder {
                id: uuid::Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                remind_at: draft.remind_at,
                ai_generated: draft.ai_generated,
                active: true,
                created_at: now,
            };
            conn.execute(
                "INSERT INTO reminders
                 (id, owner_id, title, description, remind_at, ai_generated, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                params![
                    reminder.id,
                    reminder.owner_id,
                    reminder.title,
                    reminder.description,
                    reminder.remind_at.to_rfc3339(),
                    reminder.ai_generated as i64,
                    reminder.created_at.to_rfc3339(),
                ],
            )
            .map_err(store_err)?;
            created.push(reminder);
        }
        Ok(created)
    }

    async fn get_reminder(&self, owner_id: &str, id: &str) -> Result<Reminder> {
        self.load_reminder(owner_id, id)
    }

    async fn list_reminders(
        &self,
        owner_id: &str,
        active_only: bool,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Reminder>> {
        let mut sql = format!(
            "SELECT {} FROM reminders WHERE owner_id = ?1",
            Self::REMINDER_COLS
        );
        if active_only {
            sql.push_str(" AND active = 1");
        }
        sql.push_str(" ORDER BY remind_at ASC");
        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            limit.map(i64::from).unwrap_or(-1),
            offset.unwrap_or(0)
        ));

        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params![owner_id], Self::row_to_reminder)
            .map_err(store_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn has_active_reminder(&self, owner_id: &str, title: &str) -> Result<bool> {
        let conn = self.conn.lock().map_err(store_err)?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM reminders
                 WHERE owner_id = ?1 AND title = ?2 AND active = 1",
                params![owner_id, title],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        Ok(count > 0)
    }

    async fn set_reminder_time(
        &self,
        owner_id: &str,
        id: &str,
        remind_at: DateTime<Utc>,
    ) -> Result<Reminder> {
        {
            let conn = self.conn.lock().map_err(store_err)?;
            let affected = conn
                .execute(
                    "UPDATE reminders SET remind_at = ?1 WHERE id = ?2 AND owner_id = ?3",
                    params![remind_at.to_rfc3339(), id, owner_id],
                )
                .map_err(store_err)?;
            if affected == 0 {
                return Err(LifeClawError::NotFound(format!("reminder {id}")));
            }
        }
        self.load_reminder(owner_id, id)
    }

    async fn deactivate_reminder(&self, owner_id: &str, id: &str) -> Result<Reminder> {
        {
            let conn = self.conn.lock().map_err(store_err)?;
            let affected = conn
                .execute(
                    "UPDATE reminders SET active = 0 WHERE id = ?1 AND owner_id = ?2",
                    params![id, owner_id],
                )
                .map_err(store_err)?;
            if affected == 0 {
                return Err(LifeClawError::NotFound(format!("reminder {id}")));
            }
        }
        self.load_reminder(owner_id, id)
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn create_tasks(&self, owner_id: &str, drafts: &[TaskDraft]) -> Result<Vec<PrepTask>> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        let conn = self.conn.lock().map_err(store_err)?;
        for draft in drafts {
            let task = PrepTask {
                id: uuid::Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                priority: draft.priority.unwrap_or_default(),
                status: TaskStatus::Pending,
                ai_generated: draft.ai_generated,
                created_at: now,
            };
            conn.execute(
                "INSERT INTO prep_tasks
                 (id, owner_id, title, description, priority, status, ai_generated, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id,
                    task.owner_id,
                    task.title,
                    task.description,
                    task.priority.as_str(),
                    task.status.as_str(),
                    task.ai_generated as i64,
                    task.created_at.to_rfc3339(),
                ],
            )
            .map_err(store_err)?;
            created.push(task);
        }
        Ok(created)
    }

    async fn list_tasks(
        &self,
        owner_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<PrepTask>> {
        let sql = format!(
            "SELECT id, owner_id, title, description, priority, status, ai_generated, created_at
             FROM prep_tasks WHERE owner_id = ?1 ORDER BY created_at ASC LIMIT {} OFFSET {}",
            limit.map(i64::from).unwrap_or(-1),
            offset.unwrap_or(0)
        );
        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                let priority: String = row.get(4)?;
                let status: String = row.get(5)?;
                let created: String = row.get(7)?;
                Ok(PrepTask {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    priority: TaskPriority::parse(&priority).unwrap_or_default(),
                    status: TaskStatus::parse(&status).unwrap_or_default(),
                    ai_generated: row.get::<_, i64>(6)? != 0,
                    created_at: parse_ts(&created),
                })
            })
            .map_err(store_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn upsert_subscription(
        &self,
        owner_id: &str,
        destination: &serde_json::Value,
    ) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO push_subscriptions (owner_id, destination, created_at)
             VALUES (?1, ?2, ?3)",
            params![owner_id, destination.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_subscription(&self, owner_id: &str) -> Result<Option<PushSubscription>> {
        let conn = self.conn.lock().map_err(store_err)?;
        let row = conn
            .query_row(
                "SELECT owner_id, destination, created_at FROM push_subscriptions
                 WHERE owner_id = ?1",
                params![owner_id],
                |row| {
                    let destination: String = row.get(1)?;
                    let created: String = row.get(2)?;
                    Ok(PushSubscription {
                        owner_id: row.get(0)?,
                        destination: serde_json::from_str(&destination).unwrap_or_default(),
                        created_at: parse_ts(&created),
                    })
                },
            );
        match row {
            Ok(sub) => Ok(Some(sub)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(store_err(e)),
        }
    }

    async fn delete_subscription(&self, owner_id: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(
            "DELETE FROM push_subscriptions WHERE owner_id = ?1",
            params![owner_id],
        )
        .map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn draft(title: &str, due: DateTime<Utc>) -> ObligationDraft {
        ObligationDraft {
            title: title.into(),
            category: Category::Finance,
            kind: ObligationKind::OneTime,
            due_date: due,
            frequency: None,
            risk_level: Some(RiskLevel::High),
            consequence: Some("late fee".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_obligation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let due = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
        let created = store
            .create_obligation("u1", &draft("Pay taxes", due), ObligationStatus::Active)
            .await
            .unwrap();

        let loaded = store.get_obligation("u1", &created.id).await.unwrap();
        assert_eq!(loaded.title, "Pay taxes");
        assert_eq!(loaded.due_date, due);
        assert_eq!(loaded.risk_level, RiskLevel::High);

        // Ownership scoping: another owner cannot see it
        assert!(store.get_obligation("u2", &created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let store = SqliteStore::open_in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
        for i in 0..5 {
            store
                .create_obligation(
                    "u1",
                    &draft(&format!("o{i}"), base + Duration::days(i)),
                    ObligationStatus::Active,
                )
                .await
                .unwrap();
        }

        let filter = ObligationFilter {
            status: Some(ObligationStatus::Active),
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        };
        let page = store.list_obligations("u1", &filter).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "o1");

        let none = store
            .list_obligations("u1", &ObligationFilter::status(ObligationStatus::Overdue))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mark_overdue_skips_non_active() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        let o = store
            .create_obligation("u1", &draft("bill", now - Duration::days(1)), ObligationStatus::Active)
            .await
            .unwrap();

        store.mark_overdue(&[o.id.clone()], now).await.unwrap();
        let flipped = store.get_obligation("u1", &o.id).await.unwrap();
        assert_eq!(flipped.status, ObligationStatus::Overdue);

        // Second flip is a no-op, not an error
        store.mark_overdue(&[o.id.clone()], now).await.unwrap();
        assert_eq!(
            store.get_obligation("u1", &o.id).await.unwrap().status,
            ObligationStatus::Overdue
        );
    }

    #[tokio::test]
    async fn test_scan_crosses_owners() {
        let store = SqliteStore::open_in_memory().unwrap();
        let due = Utc::now() + Duration::days(1);
        store
            .create_obligation("u1", &draft("a", due), ObligationStatus::Active)
            .await
            .unwrap();
        store
            .create_obligation("u2", &draft("b", due), ObligationStatus::Active)
            .await
            .unwrap();

        let all = store
            .scan_obligations(&ObligationFilter::status(ObligationStatus::Active))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        // Owner-scoped listing still sees only its own rows
        let mine = store
            .list_obligations("u1", &ObligationFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_reminder_batch_and_dedupe_check() {
        let store = SqliteStore::open_in_memory().unwrap();
        let at = Utc::now() + Duration::hours(3);
        let drafts = vec![
            ReminderDraft {
                title: "Reminder: Pay taxes".into(),
                description: "due in 3 days".into(),
                remind_at: at,
                ai_generated: true,
            },
            ReminderDraft {
                title: "Reminder: Renew visa".into(),
                description: String::new(),
                remind_at: at,
                ai_generated: true,
            },
        ];
        let created = store.create_reminders("u1", &drafts).await.unwrap();
        assert_eq!(created.len(), 2);

        assert!(store.has_active_reminder("u1", "Reminder: Pay taxes").await.unwrap());
        assert!(!store.has_active_reminder("u2", "Reminder: Pay taxes").await.unwrap());

        let deactivated = store
            .deactivate_reminder("u1", &created[0].id)
            .await
            .unwrap();
        assert!(!deactivated.active);
        assert!(!store.has_active_reminder("u1", "Reminder: Pay taxes").await.unwrap());
    }

    #[tokio::test]
    async fn test_subscription_upsert_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_subscription("u1", &serde_json::json!({"endpoint": "https://a"}))
            .await
            .unwrap();
        store
            .upsert_subscription("u1", &serde_json::json!({"endpoint": "https://b"}))
            .await
            .unwrap();

        let sub = store.get_subscription("u1").await.unwrap().unwrap();
        assert_eq!(sub.destination["endpoint"], "https://b");

        store.delete_subscription("u1").await.unwrap();
        assert!(store.get_subscription("u1").await.unwrap().is_none());
        // Deleting again stays a no-op
        store.delete_subscription("u1").await.unwrap();
    }
}
