// src/dag/select.rs

use std::collections::HashMap;

use crate::dag::cascade::cascade_skip;
use crate::dag::cycles::detect_cycles;
use crate::errors::{Result, TaskweaveError};
use crate::model::{Task, WorkflowState};
use crate::types::{TaskId, TaskStatus};

/// Tasks picked by a selection call, plus the cascade it performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Indices into the task slice, definition order.
    pub picked: Vec<usize>,
    pub newly_skipped: Vec<TaskId>,
}

/// Refuse new work while a batch is checked out.
pub fn ensure_no_batch_in_flight(state: &WorkflowState) -> Result<()> {
    if state.active_task_ids.is_empty() {
        Ok(())
    } else {
        Err(TaskweaveError::BatchInFlight(state.active_task_ids.clone()))
    }
}

/// First eligible pending task, after the cycle check and cascade.
pub fn find_next_task(tasks: &mut [Task]) -> Result<Selection> {
    let mut selection = prepare(tasks)?;
    selection.picked = eligible(tasks).into_iter().take(1).collect();
    Ok(selection)
}

/// Every eligible pending task, truncated to `max_parallel` when set.
pub fn find_parallel_tasks(tasks: &mut [Task], max_parallel: Option<usize>) -> Result<Selection> {
    let mut selection = prepare(tasks)?;
    let mut picked = eligible(tasks);
    if let Some(limit) = max_parallel {
        picked.truncate(limit);
    }
    selection.picked = picked;
    Ok(selection)
}

fn prepare(tasks: &mut [Task]) -> Result<Selection> {
    if let Some(cycle) = detect_cycles(tasks) {
        return Err(TaskweaveError::DependencyCycle(cycle));
    }
    Ok(Selection {
        picked: Vec::new(),
        newly_skipped: cascade_skip(tasks),
    })
}

/// Pending tasks whose dependencies all exist and are `done`.
fn eligible(tasks: &[Task]) -> Vec<usize> {
    let status: HashMap<&str, TaskStatus> =
        tasks.iter().map(|t| (t.id.as_str(), t.status)).collect();

    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == TaskStatus::Pending)
        .filter(|(_, t)| {
            t.deps
                .iter()
                .all(|d| status.get(d.as_str()) == Some(&TaskStatus::Done))
        })
        .map(|(i, _)| i)
        .collect()
}
