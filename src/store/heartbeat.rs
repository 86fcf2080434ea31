// src/store/heartbeat.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// Last command seen by the store, for external diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub last_command: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub active_task_ids: Vec<TaskId>,
}

impl Heartbeat {
    pub fn now(last_command: impl Into<String>, active_task_ids: &[TaskId]) -> Self {
        Self {
            last_command: last_command.into(),
            timestamp: Utc::now(),
            active_task_ids: active_task_ids.to_vec(),
        }
    }
}
