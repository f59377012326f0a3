//! Free-text extraction oracle contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ExtractedPlan;

/// Turns raw user text into candidate obligations/tasks/reminders.
///
/// Best effort only: the core treats the output as unvalidated
/// user-equivalent input — every candidate passes the same validation as
/// manual entry before anything is persisted.
#[async_trait]
pub trait PlanExtractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedPlan>;
}
