//! API Module
//!
//! HTTP handlers and routing for the tasks REST API.
//!
//! # Endpoints
//! - `GET /tasks`, `POST /tasks` - List and create tasks
//! - `GET|PUT|DELETE /tasks/:id` - Read, update and soft-delete one task
//! - `GET /stats` - Cache outcome counters
//! - `GET /health` - Liveness of the store and the cache
//! - `GET /ping` - Plain `pong`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
