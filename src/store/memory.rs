//! In-memory record store, used when no database URL is configured and in
//! tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{NewTask, Task, TaskId};
use crate::store::{RecordStore, StoreResult};

#[derive(Debug)]
struct Rows {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
}

impl Default for Rows {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Map-backed store. Ids start at 1 and are never reused, soft-deleted rows
/// are kept.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<Rows>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows including soft-deleted ones.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.tasks.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let rows = self.rows.read().await;
        Ok(rows.tasks.get(&id).filter(|t| t.is_live()).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Task>> {
        let rows = self.rows.read().await;
        Ok(rows.tasks.values().filter(|t| t.is_live()).cloned().collect())
    }

    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let mut rows = self.rows.write().await;
        let id = rows.next_id;
        rows.next_id += 1;

        let now = Utc::now();
        let created = Task {
            id,
            title: task.title,
            assignee: task.assignee,
            finished: task.finished,
            comment: task.comment,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn save(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.tasks.get_mut(&task.id).filter(|t| t.is_live()) else {
            return Ok(None);
        };

        row.title = task.title.clone();
        row.assignee = task.assignee.clone();
        row.finished = task.finished;
        row.comment = task.comment.clone();
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.tasks.get_mut(&id).filter(|t| t.is_live()) else {
            return Ok(None);
        };

        row.deleted_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
