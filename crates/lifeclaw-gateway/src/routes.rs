//! API route handlers for the gateway.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{Value, json};

use lifeclaw_core::error::LifeClawError;
use lifeclaw_core::traits::{PlanExtractor as _, ReminderStore as _, TaskStore as _};
use lifeclaw_core::types::{
    Category, ExtractedPlan, ObligationChanges, ObligationDraft, ObligationFilter,
    ObligationKind, ObligationStatus,
};

use super::server::AppState;

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn error_response(e: LifeClawError) -> ApiError {
    let status = match &e {
        LifeClawError::Validation(_) => StatusCode::BAD_REQUEST,
        LifeClawError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("❌ Request failed: {e}");
    }
    (status, Json(json!({ "error": e.to_string() })))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message })),
    )
}

/// Resolve the calling owner from the `X-User-Id` header. Authentication
/// itself is handled upstream; the gateway only scopes.
fn owner_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| bad_request("missing X-User-Id header"))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "lifeclaw-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    status: Option<String>,
    category: Option<String>,
    kind: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl ListQuery {
    fn into_filter(self) -> Result<ObligationFilter, ApiError> {
        let status = match self.status.as_deref() {
            Some(s) => Some(
                ObligationStatus::parse(s).ok_or_else(|| bad_request("unknown status filter"))?,
            ),
            None => None,
        };
        let category = match self.category.as_deref() {
            Some(s) => {
                Some(Category::parse(s).ok_or_else(|| bad_request("unknown category filter"))?)
            }
            None => None,
        };
        let kind = match self.kind.as_deref() {
            Some(s) => {
                Some(ObligationKind::parse(s).ok_or_else(|| bad_request("unknown kind filter"))?)
            }
            None => None,
        };
        Ok(ObligationFilter {
            status,
            category,
            kind,
            due_before: None,
            limit: Some(self.limit.unwrap_or(50)),
            offset: self.offset,
        })
    }
}

pub async fn list_obligations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let filter = query.into_filter()?;
    let obligations = state
        .manager
        .list(&owner, &filter)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "obligations": obligations })))
}

pub async fn create_obligation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(draft): Json<ObligationDraft>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let created = state
        .manager
        .create(&owner, &draft)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "obligation": created.obligation,
        "preparation_tasks": created.preparation_tasks,
        "reminders": created.reminders,
    })))
}

pub async fn get_obligation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let obligation = state
        .manager
        .get(&owner, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "obligation": obligation })))
}

pub async fn update_obligation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(changes): Json<ObligationChanges>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let obligation = state
        .manager
        .update(&owner, &id, &changes)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "obligation": obligation })))
}

pub async fn delete_obligation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    state
        .manager
        .delete(&owner, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn complete_obligation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let obligation = state
        .manager
        .complete(&owner, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "obligation": obligation,
        "message": "Obligation completed",
    })))
}

pub async fn urgent_obligations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let urgent = state
        .manager
        .urgent(&owner)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "obligations": urgent })))
}

pub async fn stats(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    let owner = owner_id(&headers)?;
    let stats = state
        .manager
        .stats(&owner)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "obligations": stats })))
}

#[derive(Deserialize)]
pub struct ReminderQuery {
    active_only: Option<bool>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ReminderQuery>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let reminders = state
        .reminders
        .list_reminders(
            &owner,
            query.active_only.unwrap_or(true),
            Some(query.limit.unwrap_or(50)),
            query.offset,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "reminders": reminders })))
}

#[derive(Deserialize)]
pub struct SnoozeBody {
    minutes: Option<i64>,
}

pub async fn snooze_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SnoozeBody>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let reminder = state
        .reminders
        .get_reminder(&owner, &id)
        .await
        .map_err(error_response)?;
    let snoozed = state
        .reminders
        .set_reminder_time(
            &owner,
            &id,
            reminder.remind_at + Duration::minutes(body.minutes.unwrap_or(15)),
        )
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "reminder": snoozed })))
}

pub async fn complete_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let reminder = state
        .reminders
        .deactivate_reminder(&owner, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "reminder": reminder })))
}

#[derive(Deserialize)]
pub struct TaskQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TaskQuery>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let tasks = state
        .tasks
        .list_tasks(&owner, Some(query.limit.unwrap_or(50)), query.offset)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "tasks": tasks })))
}

/// On-demand deadline check: the daily sweep plus the urgent scan, reported
/// together.
pub async fn run_deadline_sweep(State(state): State<Arc<AppState>>) -> ApiResult {
    let deadline = state
        .runner
        .deadline_sweep()
        .await
        .map_err(error_response)?;
    let urgent = state.runner.urgent_sweep().await.map_err(error_response)?;
    Ok(Json(json!({
        "overdue_count": deadline.overdue_count,
        "urgent_count": urgent.urgent_count,
        "escalated_count": deadline.escalated_count + urgent.reminded_count,
    })))
}

pub async fn run_renewal_sweep(State(state): State<Arc<AppState>>) -> ApiResult {
    let report = state.runner.renewal_sweep().await.map_err(error_response)?;
    Ok(Json(json!({ "renewed_count": report.renewed_count })))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let destination = body
        .get("destination")
        .filter(|d| !d.is_null())
        .ok_or_else(|| bad_request("missing destination payload"))?;
    state
        .dispatcher
        .subscribe(&owner, destination)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "message": "Subscribed to notifications" })))
}

pub async fn unsubscribe(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    let owner = owner_id(&headers)?;
    state
        .dispatcher
        .unsubscribe(&owner)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "message": "Unsubscribed from notifications" })))
}

#[derive(Deserialize)]
pub struct PlanBody {
    input: String,
}

/// Extract a structured plan from free text. Nothing is persisted — the
/// caller reviews and posts the plan back to `accept`.
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PlanBody>,
) -> ApiResult {
    owner_id(&headers)?;
    let Some(extractor) = &state.extractor else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "extraction oracle is not configured" })),
        ));
    };
    let plan = extractor
        .extract(&body.input)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "plan": plan })))
}

pub async fn accept_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(plan): Json<ExtractedPlan>,
) -> ApiResult {
    let owner = owner_id(&headers)?;
    let outcome = state
        .manager
        .accept_plan(&owner, &plan)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn scheduler_jobs(State(state): State<Arc<AppState>>) -> ApiResult {
    let jobs = state.scheduler.lock().await.jobs();
    Ok(Json(json!({ "jobs": jobs })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_header_required() {
        let mut headers = HeaderMap::new();
        assert!(owner_id(&headers).is_err());

        headers.insert("x-user-id", "u1".parse().unwrap());
        assert_eq!(owner_id(&headers).unwrap(), "u1");

        headers.insert("x-user-id", "".parse().unwrap());
        assert!(owner_id(&headers).is_err());
    }

    #[test]
    fn test_list_query_rejects_unknown_enums() {
        let query = ListQuery {
            status: Some("archived".into()),
            category: None,
            kind: None,
            limit: None,
            offset: None,
        };
        assert!(query.into_filter().is_err());

        let query = ListQuery {
            status: Some("active".into()),
            category: Some("finance".into()),
            kind: Some("recurring".into()),
            limit: Some(10),
            offset: Some(5),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(ObligationStatus::Active));
        assert_eq!(filter.limit, Some(10));
    }
}
