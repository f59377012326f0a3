//! Data model — obligations, reminders, preparation tasks, push payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LifeClawError, Result};

/// A tracked real-world responsibility with a deadline and a consequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    /// Store-assigned id.
    pub id: String,
    /// Owner of the obligation.
    pub owner_id: String,
    pub title: String,
    pub category: Category,
    /// What happens if the deadline is missed.
    pub consequence: Option<String>,
    /// Absolute deadline — never relative.
    pub due_date: DateTime<Utc>,
    pub kind: ObligationKind,
    /// Set if and only if `kind` is `Recurring`.
    pub frequency: Option<Frequency>,
    pub risk_level: RiskLevel,
    pub status: ObligationStatus,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Obligation category — drives preparation task templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Education,
    Finance,
    Work,
    Personal,
    Health,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    OneTime,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Risk level — drives escalation density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Active,
    Completed,
    Overdue,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "education",
            Category::Finance => "finance",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "education" => Some(Category::Education),
            "finance" => Some(Category::Finance),
            "work" => Some(Category::Work),
            "personal" => Some(Category::Personal),
            "health" => Some(Category::Health),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl ObligationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationKind::OneTime => "one_time",
            ObligationKind::Recurring => "recurring",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_time" => Some(ObligationKind::OneTime),
            "recurring" => Some(ObligationKind::Recurring),
            _ => None,
        }
    }
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Active => "active",
            ObligationStatus::Completed => "completed",
            ObligationStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ObligationStatus::Active),
            "completed" => Some(ObligationStatus::Completed),
            "overdue" => Some(ObligationStatus::Overdue),
            _ => None,
        }
    }
}

/// Input for creating an obligation. Validated before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationDraft {
    pub title: String,
    pub category: Category,
    pub kind: ObligationKind,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub consequence: Option<String>,
}

impl ObligationDraft {
    /// Reject drafts that would break the frequency/kind invariant or carry
    /// an empty title. Extraction-oracle output goes through this too.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LifeClawError::Validation("title must not be empty".into()));
        }
        match (self.kind, self.frequency) {
            (ObligationKind::Recurring, None) => Err(LifeClawError::Validation(
                "recurring obligations require a frequency".into(),
            )),
            (ObligationKind::OneTime, Some(_)) => Err(LifeClawError::Validation(
                "one-time obligations must not set a frequency".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Risk level with the documented default applied.
    pub fn risk(&self) -> RiskLevel {
        self.risk_level.unwrap_or_default()
    }
}

/// Field-level update for an obligation. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObligationChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub consequence: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub status: Option<ObligationStatus>,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl ObligationChanges {
    /// Shorthand for the completion transition.
    pub fn completed_at(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(ObligationStatus::Completed),
            last_completed_at: Some(now),
            ..Self::default()
        }
    }
}

/// List filter for obligations. Owner scoping is a separate argument — the
/// administrative scans used by sweeps take no owner at all.
#[derive(Debug, Clone, Default)]
pub struct ObligationFilter {
    pub status: Option<ObligationStatus>,
    pub category: Option<Category>,
    pub kind: Option<ObligationKind>,
    /// Only rows strictly before this instant (overdue scans).
    pub due_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ObligationFilter {
    pub fn status(status: ObligationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// An escalation artifact: fires once at `remind_at`, retired by deactivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub remind_at: DateTime<Utc>,
    pub ai_generated: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub title: String,
    pub description: String,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub ai_generated: bool,
}

/// A preparation checklist item generated at obligation creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepTask {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub ai_generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// One push destination per owner — the newest subscription overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub owner_id: String,
    /// Opaque transport payload (endpoint, keys) — the core never looks
    /// inside it, only the transport does.
    pub destination: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Payload handed to the push transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Owner-scoped obligation statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObligationStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub high_risk: usize,
    /// Active and due within the next 7 days.
    pub due_soon: usize,
}

/// A structured plan extracted from free text. Best effort only — every
/// candidate re-validates before acceptance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedPlan {
    #[serde(default)]
    pub obligations: Vec<ObligationDraft>,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
    #[serde(default)]
    pub reminders: Vec<ReminderDraft>,
}

impl ExtractedPlan {
    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty() && self.tasks.is_empty() && self.reminders.is_empty()
    }
}
