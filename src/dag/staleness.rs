// src/dag/staleness.rs

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::Task;
use crate::types::{TaskId, TaskStatus};

/// Ids of `active` tasks started more than `max_age` before `now`.
///
/// Active tasks without a start stamp are never reported.
pub fn stale_active_tasks(tasks: &[Task], now: DateTime<Utc>, max_age: Duration) -> Vec<TaskId> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Active)
        .filter(|t| {
            t.timestamps
                .started
                .and_then(|started| now.signed_duration_since(started).to_std().ok())
                .is_some_and(|age| age > max_age)
        })
        .map(|t| t.id.clone())
        .collect()
}
