use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

/// A single todo item as stored by the server and mirrored by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a fresh, not yet completed record. `text` is expected to be trimmed already.
    pub fn new(id: TaskId, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl CreateTaskRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Partial update. Only the fields that are present get applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }
}

/// Counts shown under the list. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total,
            pending: total - completed,
            completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn task_serializes_with_camel_case_and_omits_missing_updated_at() {
        let task = Task::new(7, "Write tests".to_string(), stamp());
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["id"], json!(7));
        assert_eq!(value["text"], json!("Write tests"));
        assert_eq!(value["completed"], json!(false));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn task_deserializes_updated_at_when_present() {
        let raw = r#"{"id":1,"text":"A","completed":true,
            "createdAt":"2024-05-01T12:00:00Z","updatedAt":"2024-05-01T13:00:00Z"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();

        assert!(task.completed);
        assert_eq!(
            task.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn update_request_only_carries_supplied_fields() {
        let body = serde_json::to_value(UpdateTaskRequest::completed(true)).unwrap();
        assert_eq!(body, json!({ "completed": true }));

        let body = serde_json::to_value(UpdateTaskRequest::text("new")).unwrap();
        assert_eq!(body, json!({ "text": "new" }));
    }

    #[test]
    fn create_request_tolerates_missing_text() {
        let request: CreateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(request.text.is_none());
    }

    #[test]
    fn stats_count_pending_and_completed() {
        let mut done = Task::new(1, "a".to_string(), stamp());
        done.completed = true;
        let open = Task::new(2, "b".to_string(), stamp());

        let stats = TaskStats::from_tasks(&[done, open.clone(), open]);
        assert_eq!(
            stats,
            TaskStats {
                total: 3,
                pending: 2,
                completed: 1
            }
        );
        assert_eq!(TaskStats::from_tasks(&[]), TaskStats::default());
    }
}
