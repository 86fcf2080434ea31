// src/definition/model.rs

use crate::types::{make_task_id, TaskCategory, TaskId};

/// One task as written in a definition.
///
/// `deps` already use system ids (`"001"`); the parser maps the author's
/// list numbers onto them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub title: String,
    pub category: TaskCategory,
    pub deps: Vec<TaskId>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: String,
    pub tasks: Vec<TaskSpec>,
}

impl WorkflowDefinition {
    /// System id the task at `index` receives on `init`.
    pub fn id_of(index: usize) -> TaskId {
        make_task_id(index as u32 + 1)
    }
}
