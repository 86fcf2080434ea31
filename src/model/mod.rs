// src/model/mod.rs

//! Domain model: tasks, the workflow aggregate, and their state machines.
//!
//! - [`task`] holds a single task and its per-task transitions
//!   (dispatch, complete, fail/retry, skip, reset).
//! - [`progress`] holds the workflow aggregate and the workflow-level
//!   transitions (pause, resume, finishing).

pub mod progress;
pub mod task;

pub use progress::{TaskCounts, WorkflowState};
pub use task::{FailOutcome, Task, TaskTimestamps};
