//! # LifeClaw Gateway
//!
//! Thin HTTP routing over the lifecycle core. Authentication is externally
//! satisfied — callers identify themselves with the `X-User-Id` header and
//! every operation is scoped to that owner. The gateway adds no policy of its
//! own; it validates input shapes and maps core errors to status codes.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, serve};
