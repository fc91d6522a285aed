//! Client-side mirror of the server's task list.
//!
//! Every mutation follows confirm-then-apply: the request goes out first and the
//! local [`Mirror`] only changes once the server answers with success. Each
//! operation resolves to the [`Change`] the confirmation licenses; a failed
//! operation resolves to a [`SyncError`] and nothing is applied.
//!
//! Bulk operations fan out one request per record and join on all of them. If any
//! single request fails the whole operation fails and the mirror is left as it
//! was, even though the requests that did succeed are not undone on the server.
//! A reload brings the two back in line.

use std::future::Future;

use futures::future::join_all;
use thiserror::Error;

use crate::model::{Task, TaskId, TaskStats, UpdateTaskRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request could not be sent: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("failed to {action}: {source}")]
    Request {
        action: &'static str,
        source: ApiError,
    },
    #[error("failed to {action}: {failed} of {total} requests failed")]
    Bulk {
        action: &'static str,
        failed: usize,
        total: usize,
    },
}

/// Transport used by the synchronizer. The browser client implements it with
/// `fetch`; tests use an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait TodoApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, text: &str) -> Result<Task, ApiError>;
    async fn update(&self, id: TaskId, patch: &UpdateTaskRequest) -> Result<Task, ApiError>;
    async fn delete(&self, id: TaskId) -> Result<(), ApiError>;
}

/// A local mutation that a confirmed request allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Replace(Vec<Task>),
    Append(Task),
    SetCompleted { id: TaskId, completed: bool },
    SetText { id: TaskId, text: String },
    Remove(TaskId),
    RemoveCompleted,
    SetAllCompleted(bool),
}

/// Disposable local copy of the server's list, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mirror {
    tasks: Vec<Task>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn completed_ids(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect()
    }

    pub fn completed(&self, id: TaskId) -> Option<bool> {
        self.get(id).map(|t| t.completed)
    }

    /// The trimmed text worth sending for an edit: `None` when it is blank or
    /// the same as what the record already holds.
    pub fn pending_edit(&self, id: TaskId, text: &str) -> Option<String> {
        let text = text.trim();
        let unchanged = self.get(id).is_some_and(|t| t.text == text);
        if text.is_empty() || unchanged {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// `false` when every record is already completed (an empty list counts),
    /// `true` otherwise, so a mixed list gets completed.
    pub fn toggle_all_target(&self) -> bool {
        !self.tasks.iter().all(|t| t.completed)
    }

    /// Applies a confirmed change; a failure is handed back with the mirror untouched.
    pub fn settle(&mut self, outcome: Result<Option<Change>, SyncError>) -> Result<(), SyncError> {
        if let Some(change) = outcome? {
            self.apply(change);
        }
        Ok(())
    }

    pub fn apply(&mut self, change: Change) {
        match change {
            Change::Replace(tasks) => self.tasks = tasks,
            Change::Append(task) => self.tasks.push(task),
            Change::SetCompleted { id, completed } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.completed = completed;
                }
            }
            Change::SetText { id, text } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.text = text;
                }
            }
            Change::Remove(id) => self.tasks.retain(|t| t.id != id),
            Change::RemoveCompleted => self.tasks.retain(|t| !t.completed),
            Change::SetAllCompleted(completed) => {
                for task in &mut self.tasks {
                    task.completed = completed;
                }
            }
        }
    }
}

fn request_failed(action: &'static str) -> impl FnOnce(ApiError) -> SyncError {
    move |source| SyncError::Request { action, source }
}

/// Awaits every request without short-circuiting; succeeds only if all did.
async fn join_all_ok<F, T>(action: &'static str, requests: Vec<F>) -> Result<(), SyncError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let results = join_all(requests).await;
    let total = results.len();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(SyncError::Bulk {
            action,
            failed,
            total,
        })
    }
}

pub async fn load<A: TodoApi>(api: &A) -> Result<Change, SyncError> {
    let tasks = api.list().await.map_err(request_failed("load todos"))?;
    Ok(Change::Replace(tasks))
}

/// Returns `Ok(None)` without contacting the server when `text` is blank.
pub async fn add<A: TodoApi>(api: &A, text: &str) -> Result<Option<Change>, SyncError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let task = api
        .create(text)
        .await
        .map_err(request_failed("add todo"))?;
    Ok(Some(Change::Append(task)))
}

/// `current` is the mirror's flag at the time of the click; the server is sent its inverse.
pub async fn toggle<A: TodoApi>(api: &A, id: TaskId, current: bool) -> Result<Change, SyncError> {
    let completed = !current;
    api.update(id, &UpdateTaskRequest::completed(completed))
        .await
        .map_err(request_failed("toggle todo"))?;
    Ok(Change::SetCompleted { id, completed })
}

pub async fn edit<A: TodoApi>(
    api: &A,
    id: TaskId,
    text: &str,
) -> Result<Option<Change>, SyncError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    api.update(id, &UpdateTaskRequest::text(text))
        .await
        .map_err(request_failed("edit todo"))?;
    Ok(Some(Change::SetText {
        id,
        text: text.to_string(),
    }))
}

pub async fn delete<A: TodoApi>(api: &A, id: TaskId) -> Result<Change, SyncError> {
    api.delete(id)
        .await
        .map_err(request_failed("delete todo"))?;
    Ok(Change::Remove(id))
}

pub async fn clear_completed<A: TodoApi>(
    api: &A,
    completed_ids: &[TaskId],
) -> Result<Change, SyncError> {
    let requests: Vec<_> = completed_ids.iter().map(|&id| api.delete(id)).collect();
    join_all_ok("clear completed todos", requests).await?;
    Ok(Change::RemoveCompleted)
}

pub async fn toggle_all<A: TodoApi>(
    api: &A,
    ids: &[TaskId],
    target: bool,
) -> Result<Change, SyncError> {
    let patch = UpdateTaskRequest::completed(target);
    let requests: Vec<_> = ids.iter().map(|&id| api.update(id, &patch)).collect();
    join_all_ok("toggle all todos", requests).await?;
    Ok(Change::SetAllCompleted(target))
}

/// Owns a transport and a mirror and runs each operation end to end.
#[derive(Debug)]
pub struct Synchronizer<A> {
    api: A,
    mirror: Mirror,
}

impl<A: TodoApi> Synchronizer<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            mirror: Mirror::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    fn settle(&mut self, outcome: Result<Option<Change>, SyncError>) -> Result<(), SyncError> {
        self.mirror.settle(outcome).map_err(|error| {
            tracing::warn!(%error, "todo sync failed, local state unchanged");
            error
        })
    }

    pub async fn load(&mut self) -> Result<(), SyncError> {
        let outcome = load(&self.api).await.map(Some);
        self.settle(outcome)
    }

    pub async fn add(&mut self, text: &str) -> Result<(), SyncError> {
        let outcome = add(&self.api, text).await;
        self.settle(outcome)
    }

    /// Unknown ids are ignored without a request.
    pub async fn toggle(&mut self, id: TaskId) -> Result<(), SyncError> {
        let Some(current) = self.mirror.completed(id) else {
            return Ok(());
        };
        let outcome = toggle(&self.api, id, current).await.map(Some);
        self.settle(outcome)
    }

    /// Blank or unchanged text is dropped without a request.
    pub async fn edit(&mut self, id: TaskId, text: &str) -> Result<(), SyncError> {
        let Some(text) = self.mirror.pending_edit(id, text) else {
            return Ok(());
        };
        let outcome = edit(&self.api, id, &text).await;
        self.settle(outcome)
    }

    pub async fn delete(&mut self, id: TaskId) -> Result<(), SyncError> {
        let outcome = delete(&self.api, id).await.map(Some);
        self.settle(outcome)
    }

    pub async fn clear_completed(&mut self) -> Result<(), SyncError> {
        let ids = self.mirror.completed_ids();
        let outcome = clear_completed(&self.api, &ids).await.map(Some);
        self.settle(outcome)
    }

    pub async fn toggle_all(&mut self) -> Result<(), SyncError> {
        let target = self.mirror.toggle_all_target();
        let ids = self.mirror.ids();
        let outcome = toggle_all(&self.api, &ids, target).await.map(Some);
        self.settle(outcome)
    }
}
