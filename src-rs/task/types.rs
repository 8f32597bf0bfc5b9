use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::ParseOutput;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Completed | TaskStatus::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Forward-only: Pending -> Processing -> {Completed, Failed}.
    /// Staying put is allowed for non-terminal states.
    pub fn can_move_to(&self, next: TaskStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self == next || next.rank() > self.rank()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task_id")]
    pub id: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub result: Option<ParseOutput>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields to merge into a task. Build with the constructors so that
/// `result` only travels with `Completed` and `error` only with `Failed`.
#[derive(Clone, Debug, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub result: Option<ParseOutput>,
    pub error: Option<String>,
}

impl TaskUpdate {
    pub fn processing(progress: f64) -> Self {
        Self {
            status: Some(TaskStatus::Processing),
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn completed(result: ParseOutput) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            progress: Some(1.0),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}
