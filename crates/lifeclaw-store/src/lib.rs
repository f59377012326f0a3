//! # LifeClaw Store
//!
//! SQLite-backed persistence for all LifeClaw entities. Single-file database,
//! WAL mode, no external services — survives restarts and supports the
//! per-row idempotent updates the sweeps rely on.

pub mod sqlite;

pub use sqlite::SqliteStore;
