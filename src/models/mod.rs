//! Request and Response models for the tasks API
//!
//! This module defines the task entity and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod responses;
pub mod task;

// Re-export commonly used types
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
pub use task::{NewTask, Task, TaskId, TaskPatch, MAX_TITLE_LENGTH};
