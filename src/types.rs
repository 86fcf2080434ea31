// src/types.rs

//! Small shared value types: ids and the closed status/category sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task id type used throughout the crate (`"001"`, `"042"`, ...).
pub type TaskId = String;

/// Format a task sequence number as a task id (at least three digits).
pub fn make_task_id(n: u32) -> TaskId {
    format!("{n:03}")
}

/// Per-task status.
///
/// `Done`, `Skipped` and `Failed` are terminal: normal flow never revisits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Active,
    Done,
    Skipped,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Skipped | TaskStatus::Failed)
    }

    /// `Failed` or `Skipped`: dependents of such a task can never run.
    pub fn blocks_dependents(self) -> bool {
        matches!(self, TaskStatus::Skipped | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "active" => Ok(TaskStatus::Active),
            "done" => Ok(TaskStatus::Done),
            "skipped" => Ok(TaskStatus::Skipped),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("invalid task status: {other}")),
        }
    }
}

/// Workflow-level status.
///
/// - `Idle`: paused; no active batch, workflow still open.
/// - `Running`: normal dispatch loop.
/// - `Finishing`: every task terminal, waiting on the finalize gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Running,
    Finishing,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Finishing => "finishing",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idle" => Ok(WorkflowStatus::Idle),
            "running" => Ok(WorkflowStatus::Running),
            "finishing" => Ok(WorkflowStatus::Finishing),
            other => Err(format!(
                "invalid workflow status: {other} (expected \"idle\", \"running\" or \"finishing\")"
            )),
        }
    }
}

/// Which kind of specialised handling a dispatched worker should apply.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Frontend,
    Backend,
    #[default]
    General,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Frontend => "frontend",
            TaskCategory::Backend => "backend",
            TaskCategory::General => "general",
        }
    }

    /// Lenient parse used by the document and definition parsers:
    /// anything unrecognised is `General`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(TaskCategory::General)
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frontend" => Ok(TaskCategory::Frontend),
            "backend" => Ok(TaskCategory::Backend),
            "general" => Ok(TaskCategory::General),
            other => Err(format!(
                "invalid task category: {other} (expected \"frontend\", \"backend\" or \"general\")"
            )),
        }
    }
}
