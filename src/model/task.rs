// src/model/task.rs

//! A single dispatchable task and its state transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, TaskweaveError};
use crate::types::{TaskCategory, TaskId, TaskStatus};

/// Summary written on tasks skipped by cascade.
pub const CASCADE_SKIP_REASON: &str = "skipped: upstream dependency failed";

/// Summary written on tasks skipped by hand.
pub const MANUAL_SKIP_REASON: &str = "skipped manually";

/// Lifecycle timestamps of a task. Only `created` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTimestamps {
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed: Option<DateTime<Utc>>,
}

impl TaskTimestamps {
    pub fn created_at(created: DateTime<Utc>) -> Self {
        Self {
            created,
            started: None,
            completed: None,
            last_failed: None,
        }
    }
}

/// Result of reporting a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// The task went back to `pending`; `attempt` failures so far.
    Retry { attempt: u32 },
    /// The retry ceiling was reached; the task is now `failed`.
    Exhausted { attempts: u32 },
}

/// One unit of dispatchable work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub status: TaskStatus,
    /// Tasks that must be `done` before this one is eligible.
    pub deps: Vec<TaskId>,
    pub summary: String,
    pub retries: u32,
    /// One entry per failed attempt; `fail_history.len() == retries`.
    pub fail_history: Vec<String>,
    pub timestamps: TaskTimestamps,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        category: TaskCategory,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            status: TaskStatus::Pending,
            deps: Vec::new(),
            summary: String::new(),
            retries: 0,
            fail_history: Vec::new(),
            timestamps: TaskTimestamps::created_at(created),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `pending → active`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.expect_status(TaskStatus::Pending, "dispatch")?;
        self.status = TaskStatus::Active;
        self.timestamps.started = Some(now);
        debug!(task = %self.id, "task dispatched");
        Ok(())
    }

    /// `active → done`.
    pub fn complete(&mut self, summary: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        self.expect_status(TaskStatus::Active, "complete")?;
        self.status = TaskStatus::Done;
        self.summary = summary.into();
        self.timestamps.completed = Some(now);
        debug!(task = %self.id, "task done");
        Ok(())
    }

    /// `active → pending` while below `max_retries`, `active → failed` once the
    /// ceiling is reached.
    pub fn fail(&mut self, reason: &str, max_retries: u32, now: DateTime<Utc>) -> Result<FailOutcome> {
        self.expect_status(TaskStatus::Active, "fail")?;
        self.retries += 1;
        self.timestamps.last_failed = Some(now);
        self.timestamps.started = None;
        let reason = if reason.trim().is_empty() {
            "no reason given"
        } else {
            reason.trim()
        };
        self.fail_history
            .push(format!("[attempt {}] {}", self.retries, reason));

        if self.retries >= max_retries {
            self.status = TaskStatus::Failed;
            debug!(task = %self.id, attempts = self.retries, "retry ceiling reached; task failed");
            Ok(FailOutcome::Exhausted {
                attempts: self.retries,
            })
        } else {
            self.status = TaskStatus::Pending;
            debug!(task = %self.id, attempt = self.retries, "task failed; will retry");
            Ok(FailOutcome::Retry {
                attempt: self.retries,
            })
        }
    }

    /// Mark a pending or active task skipped. Terminal tasks keep their
    /// status and summary.
    pub fn skip(&mut self, reason: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TaskweaveError::InvalidState(format!(
                "task {} is already {} and cannot be skipped",
                self.id, self.status
            )));
        }
        self.status = TaskStatus::Skipped;
        self.summary = reason.to_string();
        self.timestamps.started = None;
        Ok(())
    }

    /// `active → pending` without counting a failure (interrupted attempt).
    ///
    /// Returns `true` if the task was active.
    pub fn reset_if_active(&mut self) -> bool {
        if self.status != TaskStatus::Active {
            return false;
        }
        self.status = TaskStatus::Pending;
        self.timestamps.started = None;
        true
    }

    fn expect_status(&self, expected: TaskStatus, action: &str) -> Result<()> {
        if self.status != expected {
            return Err(TaskweaveError::InvalidState(format!(
                "cannot {action} task {}: status is {}, expected {}",
                self.id, self.status, expected
            )));
        }
        Ok(())
    }
}
