//! Task Cache - task records API with a cache-aside layer
//!
//! Tasks live in a record store (PostgreSQL or in-memory); reads are served
//! through a TTL cache (Redis or in-memory) that writes invalidate.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::ServiceError;
pub use tasks::{spawn_cleanup_task, spawn_health_task, HealthStatus};
