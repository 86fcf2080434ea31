// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only invariant violations and I/O failures are errors. Expected workflow
//! outcomes (verification failed, commit failed, review still pending) are
//! carried in the report types returned by [`crate::service`].

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum TaskweaveError {
    #[error("invalid task definition:\n{}", format_list(.0))]
    Definition(Vec<String>),

    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<TaskId>),

    #[error("could not acquire lock {path:?} within {waited_ms}ms; another taskweave process may be running")]
    LockTimeout { path: PathBuf, waited_ms: u128 },

    #[error(
        "{} task(s) still active ({}); checkpoint them or run `resume` before requesting more work",
        .0.len(),
        .0.join(",")
    )]
    BatchInFlight(Vec<TaskId>),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("no workflow found; run `init` first")]
    NoWorkflow,

    #[error("workflow '{0}' is still open; use --force to replace it")]
    WorkflowExists(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskweaveError>;
