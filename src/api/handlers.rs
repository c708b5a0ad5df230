//! API Handlers
//!
//! HTTP request handlers for each endpoint. Task handlers only translate
//! between HTTP and coordinator calls.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::coordinator::Coordinator;
use crate::error::{Result, ServiceError};
use crate::models::{HealthResponse, NewTask, StatsResponse, Task, TaskPatch};
use crate::tasks::HealthStatus;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside coordinator over the configured backends
    pub coordinator: Arc<Coordinator>,
    /// Probe results written by the liveness task
    pub health: HealthStatus,
}

impl AppState {
    /// Creates a new AppState.
    ///
    /// The coordinator is attached to `health` so that its bypass decisions
    /// follow the liveness task.
    pub fn new(coordinator: Coordinator, health: HealthStatus) -> Self {
        Self {
            coordinator: Arc::new(coordinator.with_health(health.clone())),
            health,
        }
    }
}

/// Malformed or mistyped JSON bodies are input errors (400), like any other
/// invalid payload.
fn bad_body(rejection: JsonRejection) -> ServiceError {
    ServiceError::InvalidInput(rejection.body_text())
}

/// Handler for GET /tasks (and GET /)
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Task>>> {
    let tasks = state.coordinator.list().await?;
    Ok(Json(tasks))
}

/// Handler for POST /tasks
pub async fn create_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>)> {
    let Json(new_task) = payload.map_err(bad_body)?;
    let task = state.coordinator.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for GET /tasks/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let task = state.coordinator.read(&id).await?;
    Ok(Json(task))
}

/// Handler for PUT /tasks/:id
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>> {
    let Json(patch) = payload.map_err(bad_body)?;
    let task = state.coordinator.update(&id, patch).await?;
    Ok(Json(task))
}

/// Handler for DELETE /tasks/:id
///
/// Responds with the task as it was soft-deleted.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let task = state.coordinator.delete(&id).await?;
    Ok(Json(task))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.coordinator.stats()))
}

/// Handler for GET /health
///
/// 503 while the record store is down; a down cache only degrades.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse::new(state.health.store_up(), state.health.cache_up());
    let status = if response.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Handler for GET /ping
pub async fn ping_handler() -> &'static str {
    "pong"
}
