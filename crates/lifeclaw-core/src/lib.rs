//! # LifeClaw Core
//!
//! Shared foundation for the LifeClaw workspace: the obligation data model,
//! configuration, the error type, and the traits that decouple the lifecycle
//! core from its external collaborators (record store, push transport,
//! free-text extraction oracle).
//!
//! ## Architecture
//! ```text
//! lifeclaw-lifecycle ──┐
//! lifeclaw-scheduler ──┼── traits ──┬── lifeclaw-store   (SQLite)
//! lifeclaw-notify ─────┤            ├── HttpPushTransport
//! lifeclaw-gateway ────┘            └── OpenAiExtractor
//! ```

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use config::LifeClawConfig;
pub use error::{LifeClawError, PushError, Result};
