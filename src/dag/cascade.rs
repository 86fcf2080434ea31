// src/dag/cascade.rs

use std::collections::HashMap;

use tracing::info;

use crate::model::task::CASCADE_SKIP_REASON;
use crate::model::Task;
use crate::types::{TaskId, TaskStatus};

/// Mark every pending task that (transitively) depends on a failed or
/// skipped task as `skipped`.
///
/// Returns the newly skipped ids in definition order. Running it twice in a
/// row skips nothing the second time.
pub fn cascade_skip(tasks: &mut [Task]) -> Vec<TaskId> {
    let index: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    // dependents[i] = tasks that list tasks[i] as a dependency.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.deps {
            if let Some(&d) = index.get(dep) {
                dependents[d].push(i);
            }
        }
    }

    let mut worklist: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status.blocks_dependents())
        .map(|(i, _)| i)
        .collect();

    let mut newly = Vec::new();
    while let Some(current) = worklist.pop() {
        for &dependent in &dependents[current] {
            let task = &mut tasks[dependent];
            if task.status != TaskStatus::Pending {
                continue;
            }
            task.status = TaskStatus::Skipped;
            task.summary = CASCADE_SKIP_REASON.to_string();
            newly.push(dependent);
            worklist.push(dependent);
        }
    }

    newly.sort_unstable();
    let skipped: Vec<TaskId> = newly.into_iter().map(|i| tasks[i].id.clone()).collect();
    if !skipped.is_empty() {
        info!(tasks = ?skipped, "cascade-skipped dependents of failed/skipped tasks");
    }
    skipped
}
