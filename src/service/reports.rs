// src/service/reports.rs

//! Results of service operations and their plain-text rendering.
//!
//! Expected workflow outcomes (a failed verification, a pending review, a
//! commit error) live here rather than in the error type.

use std::fmt;

use crate::model::{Task, TaskCounts, WorkflowState};
use crate::store::HistoryEntry;
use crate::types::{TaskId, TaskStatus};

fn join_or_none(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::Active => "[>]",
        TaskStatus::Done => "[x]",
        TaskStatus::Skipped => "[-]",
        TaskStatus::Failed => "[!]",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub name: String,
    pub task_count: usize,
    pub warnings: Vec<String>,
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initialized workflow '{}' with {} task(s)", self.name, self.task_count)?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        write!(f, "Run `taskweave next-batch` to start.")
    }
}

/// A task handed to a worker together with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedTask {
    pub task: Task,
    /// Rolling summary followed by the outputs of the task's dependencies.
    pub context: String,
}

/// Result of `next` / `next-batch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextReport {
    pub tasks: Vec<DispatchedTask>,
    pub newly_skipped: Vec<TaskId>,
    /// Every task is terminal; the workflow waits on `finish`.
    pub all_finished: bool,
}

impl fmt::Display for NextReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.newly_skipped.is_empty() {
            writeln!(
                f,
                "Skipped (upstream dependency failed): {}",
                self.newly_skipped.join(", ")
            )?;
        }
        if self.tasks.is_empty() {
            return if self.all_finished {
                write!(f, "All tasks finished. Run `taskweave finish`.")
            } else {
                write!(f, "No task is ready to run.")
            };
        }
        for (i, dispatched) in self.tasks.iter().enumerate() {
            let task = &dispatched.task;
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "=== task {} [{}] {} ===", task.id, task.category, task.title)?;
            writeln!(f, "deps: {}", join_or_none(&task.deps))?;
            if !task.description.is_empty() {
                writeln!(f, "description: {}", task.description)?;
            }
            if !dispatched.context.is_empty() {
                writeln!(f, "--- context ---")?;
                writeln!(f, "{}", dispatched.context.trim_end())?;
            }
        }
        Ok(())
    }
}

/// What a checkpoint reports about a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointInput {
    Success {
        detail: String,
        /// Files to commit; `None` commits the whole tree.
        files: Option<Vec<String>>,
    },
    Failure {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    Disabled,
    Committed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointReport {
    Completed {
        id: TaskId,
        done: usize,
        total: usize,
        commit: CommitStatus,
        all_finished: bool,
    },
    Retrying {
        id: TaskId,
        attempt: u32,
        max_retries: u32,
    },
    Failed {
        id: TaskId,
        attempts: u32,
        newly_skipped: Vec<TaskId>,
        all_finished: bool,
    },
}

impl fmt::Display for CheckpointReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointReport::Completed {
                id,
                done,
                total,
                commit,
                all_finished,
            } => {
                write!(f, "Task {id} done ({done}/{total})")?;
                match commit {
                    CommitStatus::Disabled => {}
                    CommitStatus::Committed => write!(f, " [committed]")?,
                    CommitStatus::Failed(err) => write!(
                        f,
                        "\ncommit failed: {err}\nFix the problem and commit manually (git add -A && git commit)."
                    )?,
                }
                if *all_finished {
                    write!(f, "\nAll tasks finished. Run `taskweave finish`.")?;
                }
                Ok(())
            }
            CheckpointReport::Retrying {
                id,
                attempt,
                max_retries,
            } => write!(f, "Task {id} failed (attempt {attempt}/{max_retries}); it will be retried"),
            CheckpointReport::Failed {
                id,
                attempts,
                newly_skipped,
                all_finished,
            } => {
                write!(f, "Task {id} failed {attempts} time(s) and is now marked failed")?;
                if !newly_skipped.is_empty() {
                    write!(f, "\nSkipped dependents: {}", newly_skipped.join(", "))?;
                }
                if *all_finished {
                    write!(f, "\nAll tasks finished. Run `taskweave finish`.")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReport {
    /// The task was already `done`, `skipped` or `failed`; nothing changed.
    AlreadyTerminal {
        id: TaskId,
        status: TaskStatus,
    },
    Skipped {
        id: TaskId,
        title: String,
        /// The task was checked out; its worker may still be running.
        was_active: bool,
        newly_skipped: Vec<TaskId>,
    },
}

impl fmt::Display for SkipReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReport::AlreadyTerminal { id, status } => {
                write!(f, "Task {id} is already {status}; nothing to skip")
            }
            SkipReport::Skipped {
                id,
                title,
                was_active,
                newly_skipped,
            } => {
                write!(f, "Skipped task {id}: {title}")?;
                if *was_active {
                    write!(f, " (warning: task was active; its worker may still be running)")?;
                }
                if !newly_skipped.is_empty() {
                    write!(f, "\nSkipped dependents: {}", newly_skipped.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub id: TaskId,
    pub title: String,
    /// The workflow was `finishing` and went back to `running`.
    pub reopened: bool,
}

impl fmt::Display for AddReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Added task {}: {}", self.id, self.title)?;
        if self.reopened {
            write!(f, " (workflow reopened)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task: Task,
    pub output: Option<String>,
    pub max_retries: u32,
}

impl fmt::Display for TaskDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task = &self.task;
        writeln!(f, "=== task {} ===", task.id)?;
        writeln!(f, "title: {}", task.title)?;
        writeln!(f, "category: {}", task.category)?;
        writeln!(f, "status: {}", task.status)?;
        writeln!(f, "deps: {}", join_or_none(&task.deps))?;
        write!(f, "retries: {}/{}", task.retries, self.max_retries)?;
        if !task.description.is_empty() {
            write!(f, "\ndescription: {}", task.description)?;
        }
        if !task.summary.is_empty() {
            write!(f, "\nsummary: {}", task.summary)?;
        }
        if let Some(started) = task.timestamps.started {
            write!(f, "\nstarted: {}", started.to_rfc3339())?;
        }
        if let Some(completed) = task.timestamps.completed {
            write!(f, "\ncompleted: {}", completed.to_rfc3339())?;
        }
        if !task.fail_history.is_empty() {
            write!(f, "\n\n--- failures ---")?;
            for entry in &task.fail_history {
                write!(f, "\n  {entry}")?;
            }
        }
        if let Some(output) = &self.output {
            write!(f, "\n\n--- output ---\n{}", output.trim_end())?;
        }
        Ok(())
    }
}

/// Tail of the history log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryReport {
    pub entries: Vec<HistoryEntry>,
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No history yet.");
        }
        let lines: Vec<String> = self.entries.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: WorkflowState,
    pub counts: TaskCounts,
    /// Active tasks older than the requested bound, if one was given.
    pub stale: Vec<TaskId>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(f, "{} [{}]", self.state.name, self.state.status)?;
        writeln!(
            f,
            "progress: {}/{} finished (done {}, skipped {}, failed {}, active {}, pending {})",
            c.finished(),
            c.total(),
            c.done,
            c.skipped,
            c.failed,
            c.active,
            c.pending
        )?;
        for task in &self.state.tasks {
            write!(
                f,
                "\n{} {} [{}] {}",
                status_icon(task.status),
                task.id,
                task.category,
                task.title
            )?;
            if !task.summary.is_empty() {
                write!(f, " - {}", task.summary)?;
            }
        }
        if !self.stale.is_empty() {
            write!(f, "\n\nstale active tasks: {}", self.stale.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseReport {
    pub name: String,
    pub reset: Vec<TaskId>,
}

impl fmt::Display for PauseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Workflow '{}' paused", self.name)?;
        if !self.reset.is_empty() {
            write!(f, "; reset active tasks {}", self.reset.join(", "))?;
        }
        write!(f, ". Run `taskweave resume` to continue.")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    pub name: String,
}

impl fmt::Display for ReviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Review of '{}' recorded. Run `taskweave finish` to finalize.",
            self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    VerificationFailed {
        error: String,
        scripts: Vec<String>,
    },
    NeedsReview {
        scripts: Vec<String>,
    },
    CommitFailed {
        error: String,
    },
    Completed {
        done: usize,
        skipped: usize,
        failed: usize,
        scripts: Vec<String>,
    },
}

impl fmt::Display for FinishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishOutcome::VerificationFailed { error, scripts } => write!(
                f,
                "Verification failed:\n{error}\n\nscripts: {}\nFix the problem and run `taskweave finish` again.",
                join_or_none(scripts)
            ),
            FinishOutcome::NeedsReview { scripts } => write!(
                f,
                "Verification passed ({}). Review the changes, then run `taskweave review` and `taskweave finish`.",
                join_or_none(scripts)
            ),
            FinishOutcome::CommitFailed { error } => {
                write!(f, "Verification passed but the final commit failed: {error}")
            }
            FinishOutcome::Completed {
                done,
                skipped,
                failed,
                scripts,
            } => write!(
                f,
                "Workflow complete: done {done} | skipped {skipped} | failed {failed}\nverified with: {}",
                join_or_none(scripts)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeReport {
    NoWorkflow,
    Finishing {
        name: String,
    },
    Resumed {
        name: String,
        reset: Vec<TaskId>,
        done: usize,
        total: usize,
    },
}

impl fmt::Display for ResumeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeReport::NoWorkflow => {
                write!(f, "No workflow to resume. Run `taskweave init` to start one.")
            }
            ResumeReport::Finishing { name } => write!(
                f,
                "Workflow '{name}' is finishing. Run `taskweave finish`."
            ),
            ResumeReport::Resumed {
                name,
                reset,
                done,
                total,
            } => {
                writeln!(f, "Resumed workflow '{name}' ({done}/{total} done)")?;
                if reset.is_empty() {
                    write!(f, "No interrupted tasks. Run `taskweave next-batch` to continue.")
                } else {
                    write!(
                        f,
                        "Interrupted tasks reset to pending: {}. Run `taskweave next-batch` to continue.",
                        reset.join(", ")
                    )
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub id: TaskId,
}

impl fmt::Display for EditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated task {}", self.id)
    }
}
