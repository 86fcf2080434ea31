#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use taskweave::config::{Config, RawConfig};
use taskweave::model::{Task, WorkflowState};
use taskweave::types::{TaskCategory, TaskStatus, WorkflowStatus};

/// Fixed instant used as the default creation time in builders.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Builder for `Task`.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: Task::new(id, format!("task {id}"), TaskCategory::General, epoch()),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn category(mut self, category: TaskCategory) -> Self {
        self.task.category = category;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn deps(mut self, deps: &[&str]) -> Self {
        self.task.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.task.summary = summary.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    pub fn started(mut self, at: DateTime<Utc>) -> Self {
        self.task.timestamps.started = Some(at);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Shorthand for a task with the given status and deps.
pub fn task(id: &str, status: TaskStatus, deps: &[&str]) -> Task {
    TaskBuilder::new(id).status(status).deps(deps).build()
}

/// Builder for `WorkflowState`.
pub struct WorkflowStateBuilder {
    state: WorkflowState,
}

impl WorkflowStateBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            state: WorkflowState::new(name, epoch()),
        }
    }

    pub fn status(mut self, status: WorkflowStatus) -> Self {
        self.state.status = status;
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.state.tasks.push(task);
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.state.tasks.extend(tasks);
        self
    }

    pub fn review_done(mut self, value: bool) -> Self {
        self.state.review_done = value;
        self
    }

    pub fn verified(mut self, value: bool) -> Self {
        self.state.verified = value;
        self
    }

    /// Records every `active` task in the active set.
    pub fn build(mut self) -> WorkflowState {
        self.state.active_task_ids = self
            .state
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Active)
            .map(|t| t.id.clone())
            .collect();
        self.state
    }
}

/// Builder for `Config`.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfig::default(),
        }
    }

    pub fn auto_commit(mut self, value: bool) -> Self {
        self.raw.auto_commit = value;
        self
    }

    pub fn verify_commands(mut self, commands: &[&str]) -> Self {
        self.raw.verify_commands = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn max_parallel(mut self, value: usize) -> Self {
        self.raw.max_parallel = Some(value);
        self
    }

    pub fn max_retries(mut self, value: u32) -> Self {
        self.raw.max_retries = value;
        self
    }

    pub fn lock_timeout_ms(mut self, value: u64) -> Self {
        self.raw.lock_timeout_ms = value;
        self
    }

    pub fn summary_compress_threshold(mut self, value: usize) -> Self {
        self.raw.summary_compress_threshold = value;
        self
    }

    pub fn raw(self) -> RawConfig {
        self.raw
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
