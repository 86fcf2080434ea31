// src/store/history.rs

//! Append-only event log (`history.jsonl`), one JSON object per line.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEvent {
    Init,
    Next,
    Checkpoint,
    Fail,
    Resume,
    Add,
    Skip,
    Edit,
    Pause,
    Review,
}

impl HistoryEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryEvent::Init => "init",
            HistoryEvent::Next => "next",
            HistoryEvent::Checkpoint => "checkpoint",
            HistoryEvent::Fail => "fail",
            HistoryEvent::Resume => "resume",
            HistoryEvent::Add => "add",
            HistoryEvent::Skip => "skip",
            HistoryEvent::Edit => "edit",
            HistoryEvent::Pause => "pause",
            HistoryEvent::Review => "review",
        }
    }
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub event: HistoryEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub detail: String,
}

impl HistoryEntry {
    pub fn new(event: HistoryEvent, detail: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            event,
            task_id: None,
            detail: detail.into(),
        }
    }

    pub fn for_task(event: HistoryEvent, task_id: impl Into<TaskId>, detail: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::new(event, detail)
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:<10}", self.ts.format("%Y-%m-%d %H:%M:%S"), self.event)?;
        if let Some(id) = &self.task_id {
            write!(f, " [{id}]")?;
        }
        if !self.detail.is_empty() {
            write!(f, " {}", self.detail)?;
        }
        Ok(())
    }
}

/// Parse a history log, skipping lines that are not valid entries.
pub fn parse_lines(text: &str) -> Vec<HistoryEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping malformed history line");
                None
            }
        })
        .collect()
}
