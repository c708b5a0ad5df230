//! API Routes
//!
//! Configures the Axum router with all endpoints.

use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_handler, delete_handler, get_handler, health_handler, list_handler, ping_handler,
    stats_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /`, `GET /tasks` - List live tasks
/// - `POST /tasks` - Create a task
/// - `GET /tasks/:id` - Read a task through the cache
/// - `PUT /tasks/:id` - Update a task
/// - `DELETE /tasks/:id` - Soft-delete a task
/// - `GET /stats` - Cache outcome counters
/// - `GET /health` - Last liveness probe results
/// - `GET /ping` - Plain `pong`
///
/// # Middleware
/// - CORS: Allows any origin
/// - Timeout: Answers 408 once `request_timeout` elapses
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(list_handler))
        .route("/tasks", get(list_handler).post(create_handler))
        .route(
            "/tasks/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/ping", get(ping_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
