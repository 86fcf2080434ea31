// src/dag/mod.rs

//! Task graph algorithms and scheduling.
//!
//! Everything here is pure over `&[Task]` / `&mut WorkflowState`; loading,
//! locking and persistence belong to [`crate::service`].
//!
//! - [`cycles`] finds dependency cycles among non-terminal tasks.
//! - [`cascade`] propagates `skipped` to dependents of failed/skipped tasks.
//! - [`select`] decides which pending tasks are eligible to run.
//! - [`scheduler`] checks tasks out to workers (admission + dispatch).
//! - [`staleness`] reports active tasks that have been out for too long.

pub mod cascade;
pub mod cycles;
pub mod scheduler;
pub mod select;
pub mod staleness;

pub use cascade::cascade_skip;
pub use cycles::detect_cycles;
pub use scheduler::{Dispatch, Scheduler};
pub use select::{ensure_no_batch_in_flight, find_next_task, find_parallel_tasks, Selection};
pub use staleness::stale_active_tasks;
