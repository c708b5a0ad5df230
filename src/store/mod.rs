//! Record Store Module
//!
//! Authoritative persistence for tasks. Absence is reported as `Ok(None)`;
//! errors are reserved for infrastructure and query failures.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewTask, Task, TaskId};

pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};

// == Store Error Enum ==
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not obtain a connection, the connection broke, or the call timed out
    #[error("{0}")]
    Unavailable(String),

    /// The database rejected the statement
    #[error("query failed: {0}")]
    Query(String),
}

/// Convenience Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Record Store Trait ==
/// Durable task persistence. Soft-deleted rows are invisible to every
/// operation here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads a live task by id.
    async fn find(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Loads every live task, ordered by id.
    async fn find_all(&self) -> StoreResult<Vec<Task>>;

    /// Inserts a task and returns it with its assigned id and timestamps.
    async fn create(&self, task: NewTask) -> StoreResult<Task>;

    /// Writes the mutable fields of `task` to its live row and bumps
    /// `updated_at`. Returns `None` when no live row has that id.
    async fn save(&self, task: &Task) -> StoreResult<Option<Task>>;

    /// Soft-deletes a live task and returns it as deleted. Returns `None` when
    /// the id is unknown or already deleted.
    async fn delete(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Liveness probe used by the health task.
    async fn ping(&self) -> StoreResult<()>;
}
