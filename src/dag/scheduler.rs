// src/dag/scheduler.rs

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::dag::select::{ensure_no_batch_in_flight, find_next_task, find_parallel_tasks, Selection};
use crate::errors::{Result, TaskweaveError};
use crate::model::WorkflowState;
use crate::types::{TaskId, WorkflowStatus};

/// Structured result of a single dispatch step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Tasks that were checked out (now `active`), definition order.
    pub dispatched: Vec<TaskId>,
    /// Tasks newly marked `skipped` by the cascade run before selection.
    pub newly_skipped: Vec<TaskId>,
    /// Whether this step moved the workflow to `finishing`.
    pub workflow_finishing: bool,
}

/// Checks tasks out of a [`WorkflowState`].
///
/// The scheduler:
/// - refuses new work while a batch is in flight or the workflow is paused
/// - runs the cycle check and cascade before every selection
/// - marks selected tasks `active` and records them in the active set
/// - moves the workflow to `finishing` once nothing is left to do
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    max_parallel: Option<usize>,
}

impl Scheduler {
    pub fn new(max_parallel: Option<usize>) -> Self {
        Self { max_parallel }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.max_parallel())
    }

    /// Check out at most one task.
    pub fn dispatch_next(&self, state: &mut WorkflowState, now: DateTime<Utc>) -> Result<Dispatch> {
        Self::admit(state)?;
        let selection = find_next_task(&mut state.tasks)?;
        Self::apply(state, selection, now)
    }

    /// Check out every eligible task (bounded by `max_parallel`).
    pub fn dispatch_batch(&self, state: &mut WorkflowState, now: DateTime<Utc>) -> Result<Dispatch> {
        Self::admit(state)?;
        let selection = find_parallel_tasks(&mut state.tasks, self.max_parallel)?;
        Self::apply(state, selection, now)
    }

    fn admit(state: &WorkflowState) -> Result<()> {
        ensure_no_batch_in_flight(state)?;
        if state.status == WorkflowStatus::Idle {
            return Err(TaskweaveError::InvalidState(format!(
                "workflow '{}' is paused; run `resume` first",
                state.name
            )));
        }
        Ok(())
    }

    fn apply(state: &mut WorkflowState, selection: Selection, now: DateTime<Utc>) -> Result<Dispatch> {
        let mut dispatched = Vec::with_capacity(selection.picked.len());
        for idx in selection.picked {
            let task = &mut state.tasks[idx];
            task.start(now)?;
            dispatched.push(task.id.clone());
        }
        state.active_task_ids.extend(dispatched.iter().cloned());

        let workflow_finishing = state.settle();
        if dispatched.is_empty() {
            debug!(workflow = %state.name, "no eligible task to dispatch");
        } else {
            info!(workflow = %state.name, tasks = ?dispatched, "dispatched tasks");
        }

        Ok(Dispatch {
            dispatched,
            newly_skipped: selection.newly_skipped,
            workflow_finishing,
        })
    }
}
