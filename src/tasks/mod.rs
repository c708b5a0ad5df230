//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Liveness: pings the record store and the cache, publishes `HealthStatus`
//! - TTL Cleanup: removes expired entries from the in-memory cache

mod cleanup;
mod health;

pub use cleanup::spawn_cleanup_task;
pub use health::{probe_once, spawn_health_task, HealthStatus};
