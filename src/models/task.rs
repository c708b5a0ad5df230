//! Task model
//!
//! The stored entity plus the create and patch payloads accepted by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the record store.
pub type TaskId = i64;

/// Maximum allowed title length in bytes
pub const MAX_TITLE_LENGTH: usize = 255;

// == Task ==
/// A task as persisted by the record store.
///
/// This is also the cache payload: cache entries hold the JSON form of a `Task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the task is soft-deleted
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Returns true while the task has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// == New Task ==
/// Body of `POST /tasks`.
///
/// There is no `id` field: an id sent by the client is ignored, the store
/// assigns one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub comment: String,
}

impl NewTask {
    /// Creates a NewTask with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_title(&self.title)
    }
}

// == Task Patch ==
/// Body of `PUT /tasks/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    /// An empty string clears the assignee
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TaskPatch {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        self.title.as_deref().and_then(validate_title)
    }

    /// Overlays the provided fields onto `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(assignee) = &self.assignee {
            task.assignee = if assignee.is_empty() {
                None
            } else {
                Some(assignee.clone())
            };
        }
        if let Some(finished) = self.finished {
            task.finished = finished;
        }
        if let Some(comment) = &self.comment {
            task.comment = comment.clone();
        }
    }
}

fn validate_title(title: &str) -> Option<String> {
    if title.trim().is_empty() {
        return Some("Title cannot be empty".to_string());
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Some(format!(
            "Title exceeds maximum length of {} bytes",
            MAX_TITLE_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: 1,
            title: "A".to_string(),
            assignee: Some("ann".to_string()),
            finished: false,
            comment: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_new_task_ignores_client_id() {
        let json = r#"{"id": 99, "title": "write report"}"#;
        let req: NewTask = serde_json::from_str(json).unwrap();
        assert_eq!(req.title, "write report");
        assert!(!req.finished);
        assert!(req.assignee.is_none());
    }

    #[test]
    fn test_new_task_missing_title_is_invalid() {
        let req: NewTask = serde_json::from_str(r#"{"comment": "x"}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_blank_title() {
        assert!(NewTask::titled("   ").validate().is_some());
        assert!(NewTask::titled("ok").validate().is_none());
    }

    #[test]
    fn test_validate_title_too_long() {
        let req = NewTask::titled("x".repeat(MAX_TITLE_LENGTH + 1));
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut task = sample_task();
        let patch: TaskPatch = serde_json::from_str(r#"{"finished": true}"#).unwrap();
        patch.apply(&mut task);

        assert!(task.finished);
        assert_eq!(task.title, "A");
        assert_eq!(task.assignee.as_deref(), Some("ann"));
    }

    #[test]
    fn test_patch_empty_assignee_clears() {
        let mut task = sample_task();
        let patch = TaskPatch {
            assignee: Some(String::new()),
            ..TaskPatch::default()
        };
        patch.apply(&mut task);
        assert!(task.assignee.is_none());
    }

    #[test]
    fn test_patch_blank_title_is_invalid() {
        let patch = TaskPatch {
            title: Some("".to_string()),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_some());
        assert!(TaskPatch::default().validate().is_none());
    }

    #[test]
    fn test_task_json_shape() {
        let task = sample_task();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["title"], "A");
        assert_eq!(value["finished"], false);
        assert!(value["deleted_at"].is_null());
        assert!(value.get("created_at").is_some());
    }
}
