// src/model/progress.rs

//! The workflow aggregate persisted as the progress document.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::{Result, TaskweaveError};
use crate::model::task::Task;
use crate::types::{make_task_id, TaskId, TaskStatus, WorkflowStatus};

/// Per-status task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub pending: usize,
    pub active: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pending + self.active + self.done + self.skipped + self.failed
    }

    /// Tasks that reached a terminal status.
    pub fn finished(&self) -> usize {
        self.done + self.skipped + self.failed
    }
}

/// Root aggregate: one workflow and all of its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    pub name: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    /// Tasks currently checked out to a worker.
    pub active_task_ids: Vec<TaskId>,
    /// Definition order; also the scheduling tie-break.
    pub tasks: Vec<Task>,
    pub review_done: bool,
    pub verified: bool,
}

impl WorkflowState {
    pub fn new(name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status: WorkflowStatus::Running,
            started_at,
            active_task_ids: Vec::new(),
            tasks: Vec::new(),
            review_done: false,
            verified: false,
        }
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskweaveError::TaskNotFound(id.to_string()))
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskweaveError::TaskNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Every task is terminal (vacuously true for an empty workflow).
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(Task::is_terminal)
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Active => counts.active += 1,
                TaskStatus::Done => counts.done += 1,
                TaskStatus::Skipped => counts.skipped += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Id for the next created task: one past the highest numeric id.
    pub fn next_task_id(&self) -> TaskId {
        let max = self
            .tasks
            .iter()
            .filter_map(|t| t.id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        make_task_id(max + 1)
    }

    /// Drop `id` from the active set, if present.
    pub fn release_active(&mut self, id: &str) {
        self.active_task_ids.retain(|a| a != id);
    }

    /// Return every active task to `pending` and clear the active set.
    ///
    /// Returns the ids that were reset, in definition order.
    pub fn reset_active_tasks(&mut self) -> Vec<TaskId> {
        let mut reset = Vec::new();
        for task in self.tasks.iter_mut() {
            if task.reset_if_active() {
                reset.push(task.id.clone());
            }
        }
        self.active_task_ids.clear();
        reset
    }

    /// Clear the finalization flags (new work or a paused finalize attempt).
    pub fn clear_finalize_flags(&mut self) {
        self.review_done = false;
        self.verified = false;
    }

    /// Move a `running` workflow to `finishing` once nothing is left to do.
    ///
    /// Returns `true` if the status changed.
    pub fn settle(&mut self) -> bool {
        if self.status == WorkflowStatus::Running
            && self.active_task_ids.is_empty()
            && self.all_terminal()
        {
            self.status = WorkflowStatus::Finishing;
            info!(workflow = %self.name, "all tasks terminal; workflow is finishing");
            return true;
        }
        false
    }
}
