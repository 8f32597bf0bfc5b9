use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{Task, TaskCounts, TaskStatus, TaskUpdate};

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("task already exists: {0}")]
    Duplicate(String),

    #[error("task {id}: cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task {id}: progress cannot go from {from} to {to}")]
    ProgressRegression { id: String, from: f64, to: f64 },

    #[error("task {id}: {reason}")]
    InvalidUpdate { id: String, reason: String },

    #[error("task store lock poisoned")]
    LockPoisoned,
}

/// In-memory task records. Every operation runs under one lock, so
/// operations are linearizable with respect to each other.
pub struct TaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Task>>, TaskError> {
        self.tasks.lock().map_err(|_| TaskError::LockPoisoned)
    }

    pub fn create(&self, id: &str) -> Result<Task, TaskError> {
        let now = Utc::now();
        let task = Task {
            id: id.to_string(),
            status: TaskStatus::Pending,
            progress: 0.0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        let mut map = self.lock()?;
        if map.contains_key(id) {
            return Err(TaskError::Duplicate(id.to_string()));
        }
        map.insert(id.to_string(), task.clone());
        Ok(task)
    }

    /// Merges `update` into the record, or rejects it without touching the
    /// record if it would break the lifecycle rules.
    pub fn update(&self, id: &str, update: TaskUpdate) -> Result<Task, TaskError> {
        let mut map = self.lock()?;
        let task = map
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let next = update.status.unwrap_or(task.status);
        if !task.status.can_move_to(next) {
            return Err(TaskError::InvalidTransition {
                id: id.to_string(),
                from: task.status,
                to: next,
            });
        }
        if let Some(progress) = update.progress {
            if !(0.0..=1.0).contains(&progress) {
                return Err(TaskError::InvalidUpdate {
                    id: id.to_string(),
                    reason: format!("progress out of range: {}", progress),
                });
            }
            if progress < task.progress {
                return Err(TaskError::ProgressRegression {
                    id: id.to_string(),
                    from: task.progress,
                    to: progress,
                });
            }
        }
        if update.result.is_some() != (next == TaskStatus::Completed) {
            return Err(TaskError::InvalidUpdate {
                id: id.to_string(),
                reason: "a result is required for, and only allowed with, completed".to_string(),
            });
        }
        if update.error.is_some() != (next == TaskStatus::Failed) {
            return Err(TaskError::InvalidUpdate {
                id: id.to_string(),
                reason: "an error is required for, and only allowed with, failed".to_string(),
            });
        }

        task.status = next;
        if let Some(progress) = update.progress {
            task.progress = progress;
        }
        if update.result.is_some() {
            task.result = update.result;
        }
        if update.error.is_some() {
            task.error = update.error;
        }
        task.updated_at = Utc::now().max(task.created_at);
        Ok(task.clone())
    }

    pub fn get(&self, id: &str) -> Result<Task, TaskError> {
        let map = self.lock()?;
        map.get(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    /// Newest first.
    pub fn list(&self, limit: usize) -> Result<Vec<Task>, TaskError> {
        let map = self.lock()?;
        let mut items: Vec<Task> = map.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }

    pub fn counts(&self) -> Result<TaskCounts, TaskError> {
        let map = self.lock()?;
        let mut counts = TaskCounts::default();
        for task in map.values() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Processing => counts.processing += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cleanup_expired(&self, ttl: Duration) -> Result<usize, TaskError> {
        self.cleanup_expired_at(Utc::now(), ttl)
    }

    /// Removes every task whose age at `now` is strictly greater than `ttl`,
    /// whatever its status. Returns how many were removed.
    pub fn cleanup_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, TaskError> {
        let ttl = match chrono::Duration::from_std(ttl) {
            Ok(ttl) => ttl,
            Err(_) => return Ok(0),
        };
        let mut map = self.lock()?;
        let before = map.len();
        map.retain(|_, task| now.signed_duration_since(task.created_at) <= ttl);
        Ok(before - map.len())
    }
}

pub fn next_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
