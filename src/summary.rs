// src/summary.rs

//! Rolling summary of completed work, handed to workers as context.
//!
//! Rebuilt from scratch on every completion. Small workflows get one line per
//! done task; past the threshold the lines are grouped under a heading per
//! category so the context stays skimmable.

use crate::model::Task;
use crate::types::{TaskCategory, TaskStatus};

/// Initial summary written by `init`.
pub fn seed_summary(name: &str, description: &str) -> String {
    format!("# {name}\n\n{description}\n")
}

pub fn build_summary(name: &str, tasks: &[Task], threshold: usize) -> String {
    let done: Vec<&Task> = tasks.iter().filter(|t| t.status == TaskStatus::Done).collect();

    let mut out = format!("# {name}\n\n");
    if done.len() <= threshold {
        for task in &done {
            out.push_str(&format!(
                "- [{}] {}: {}: {}\n",
                task.category, task.id, task.title, task.summary
            ));
        }
        return out;
    }

    // Categories in order of first appearance.
    let mut groups: Vec<(TaskCategory, Vec<&Task>)> = Vec::new();
    for task in done {
        match groups.iter_mut().find(|(cat, _)| *cat == task.category) {
            Some((_, members)) => members.push(task),
            None => groups.push((task.category, vec![task])),
        }
    }

    for (i, (category, members)) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("## {category} ({} done)\n", members.len()));
        for task in members {
            out.push_str(&format!("- {}: {} -> {}\n", task.id, task.title, task.summary));
        }
    }
    out
}
