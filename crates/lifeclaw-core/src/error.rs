//! LifeClaw error types.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, LifeClawError>;

/// Top-level error for all LifeClaw operations.
#[derive(Debug, Error)]
pub enum LifeClawError {
    /// Bad input rejected before it reaches the store or the scheduler.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown id, or id not owned by the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// Record store failure (open, query, write).
    #[error("store error: {0}")]
    Store(String),

    /// Configuration load/parse/save failure.
    #[error("config error: {0}")]
    Config(String),

    /// Extraction oracle failure (request or unusable response).
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Push delivery failure that is not handled by subscription purging.
    #[error("push error: {0}")]
    Push(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LifeClawError {
    /// Whether this error should be surfaced to API callers as a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LifeClawError::NotFound(_))
    }
}

/// Outcome classification for the push transport.
///
/// `Gone` means the destination is permanently invalid and the owning
/// subscription must be purged; everything else is transient and left to the
/// next sweep.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("destination permanently gone")]
    Gone,

    #[error("transient delivery failure: {0}")]
    Transient(String),
}
