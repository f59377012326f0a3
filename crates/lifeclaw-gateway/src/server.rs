//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use lifeclaw_core::error::Result;
use lifeclaw_core::traits::{PlanExtractor, ReminderStore, TaskStore};
use lifeclaw_lifecycle::LifecycleManager;
use lifeclaw_notify::Dispatcher;
use lifeclaw_scheduler::{SweepRunner, SweepScheduler};

use crate::routes;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LifecycleManager>,
    pub runner: Arc<SweepRunner>,
    /// Scheduler engine — job snapshots for the dashboard endpoints.
    pub scheduler: Arc<tokio::sync::Mutex<SweepScheduler>>,
    pub dispatcher: Arc<Dispatcher>,
    /// Extraction oracle; `None` when disabled in config.
    pub extractor: Option<Arc<dyn PlanExtractor>>,
    pub reminders: Arc<dyn ReminderStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub start_time: std::time::Instant,
}

/// Build the full route table.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route(
            "/api/obligations",
            get(routes::list_obligations).post(routes::create_obligation),
        )
        .route("/api/obligations/urgent", get(routes::urgent_obligations))
        .route(
            "/api/obligations/{id}",
            get(routes::get_obligation)
                .put(routes::update_obligation)
                .delete(routes::delete_obligation),
        )
        .route(
            "/api/obligations/{id}/complete",
            post(routes::complete_obligation),
        )
        .route("/api/stats", get(routes::stats))
        .route("/api/reminders", get(routes::list_reminders))
        .route("/api/reminders/{id}/snooze", post(routes::snooze_reminder))
        .route(
            "/api/reminders/{id}/complete",
            post(routes::complete_reminder),
        )
        .route("/api/tasks", get(routes::list_tasks))
        .route("/api/sweeps/deadline", post(routes::run_deadline_sweep))
        .route("/api/sweeps/renewal", post(routes::run_renewal_sweep))
        .route(
            "/api/notifications/subscribe",
            post(routes::subscribe).delete(routes::unsubscribe),
        )
        .route("/api/plan", post(routes::generate_plan))
        .route("/api/plan/accept", post(routes::accept_plan))
        .route("/api/scheduler/jobs", get(routes::scheduler_jobs))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let router = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
