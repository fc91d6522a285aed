//! The authoritative, in-memory task collection.

use chrono::Utc;
use todo_shared::{Task, TaskId, UpdateTaskRequest};

use crate::error::StoreError;

const SEED_TEXTS: [&str; 2] = ["Welcome to your Todo List!", "Build an amazing app"];

/// Ordered task records plus the id counter. Ids only ever go up and are never
/// handed out twice, even after the record they named is deleted.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: TaskId,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// A store holding the two sample records a fresh server starts with.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for text in SEED_TEXTS {
            store.insert(text.to_string());
        }
        store
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn insert(&mut self, text: String) -> Task {
        let task = Task::new(self.next_id, text, Utc::now());
        self.next_id += 1;
        self.tasks.push(task.clone());
        task
    }

    pub fn create(&mut self, text: Option<&str>) -> Result<Task, StoreError> {
        let text = required_text(text)?;
        let task = self.insert(text);
        tracing::debug!(id = task.id, "created todo");
        Ok(task)
    }

    /// Applies only the supplied fields. Validation happens before anything is
    /// written, so a failed update leaves the record as it was.
    pub fn update(&mut self, id: TaskId, patch: &UpdateTaskRequest) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let text = patch
            .text
            .as_deref()
            .map(|text| required_text(Some(text)))
            .transpose()?;

        if let Some(text) = text {
            task.text = text;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.updated_at = Some(Utc::now());
        tracing::debug!(id, completed = task.completed, "updated todo");
        Ok(task.clone())
    }

    pub fn delete(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.tasks.remove(index);
        tracing::debug!(id, "deleted todo");
        Ok(removed)
    }
}

fn required_text(text: Option<&str>) -> Result<String, StoreError> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(StoreError::Validation),
    }
}
