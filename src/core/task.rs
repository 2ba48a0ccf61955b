//! Task data model for the pipeline DAG.
//!
//! Tasks are the named units of pipeline work (`lint`, `build`). Each task
//! tracks its status and timing; the work itself lives in a
//! [`TaskAction`](crate::runner::TaskAction) registered next to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of a task, unique within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Task status in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskStatus {
    /// Registered but not yet run.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Finished and signaled success.
    Completed,
    /// Finished and signaled failure.
    Failed {
        /// Error message describing the failure.
        error: String,
    },
    /// Never started because a dependency did not complete.
    Skipped {
        /// Why the task was not run.
        reason: String,
    },
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed { error } => write!(f, "failed: {}", error),
            TaskStatus::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}

/// A single task in the pipeline DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique name of this task.
    pub id: TaskId,
    /// One-line description shown by `kiln tasks`.
    pub description: String,
    /// Current execution status.
    pub status: TaskStatus,
    /// When the task started execution.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task finished (success or failure).
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: TaskId::new(name),
            description: description.to_string(),
            status: TaskStatus::Pending,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    /// Transition to Running and record the start time.
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Transition to Completed and record the completion time.
    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Transition to Failed and record the completion time.
    pub fn fail(&mut self, error: &str) {
        self.status = TaskStatus::Failed {
            error: error.to_string(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// Mark the task as not run.
    pub fn skip(&mut self, reason: &str) {
        self.status = TaskStatus::Skipped {
            reason: reason.to_string(),
        };
    }

    /// Reset to Pending so the task can run again in a fresh invocation.
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
        self.started_at = None;
        self.completed_at = None;
    }

    /// Check if the task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed { .. } | TaskStatus::Skipped { .. }
        )
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_new_is_pending() {
        let task = Task::new("lint", "Lint sources");
        assert_eq!(task.name(), "lint");
        assert_eq!(task.description, "Lint sources");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());
        assert!(!task.is_finished());
    }

    #[test]
    fn test_task_lifecycle_complete() {
        let mut task = Task::new("lint", "");
        task.start();
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.started_at.is_some());
        assert!(!task.is_finished());

        task.complete();
        assert!(task.is_completed());
        assert!(task.is_finished());
        assert!(task.completed_at.unwrap() >= task.started_at.unwrap());
    }

    #[test]
    fn test_task_fail() {
        let mut task = Task::new("build", "");
        task.start();
        task.fail("boom");
        assert!(task.is_finished());
        assert!(!task.is_completed());
        assert_eq!(format!("{}", task.status), "failed: boom");
    }

    #[test]
    fn test_task_skip_and_reset() {
        let mut task = Task::new("build", "");
        task.skip("dependency 'lint' failed");
        assert!(task.is_finished());
        assert!(task.started_at.is_none());
        assert_eq!(
            format!("{}", task.status),
            "skipped: dependency 'lint' failed"
        );

        task.reset();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_task_status_serialization() {
        let status = TaskStatus::Failed {
            error: "2 problems".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        let parsed: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_task_id_display_and_from() {
        let id: TaskId = "build".into();
        assert_eq!(format!("{}", id), "build");
        assert_eq!(id, TaskId::new("build"));
    }
}
