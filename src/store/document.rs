// src/store/document.rs

//! Codec for the progress document (`progress.md`).
//!
//! The document is meant to be read by people and agents, so the bulk of the
//! state is a Markdown table. Fields that do not fit the table (fail history,
//! timestamps, active set, finalization flags) travel in a trailing
//! `<!-- meta: {...} -->` comment. Parsing is lenient: unknown values fall
//! back to defaults and malformed rows are dropped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Task, TaskTimestamps, WorkflowState};
use crate::types::{TaskCategory, TaskId, TaskStatus, WorkflowStatus};

const TABLE_HEADER: &str = "| ID | Title | Category | Deps | Status | Retries | Summary | Description |";
const TABLE_RULE: &str = "|----|-------|----------|------|--------|---------|---------|-------------|";

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\|\s*(\d{3,})\s*\|\s*(.+?)\s*\|\s*(\w+)\s*\|\s*([^|]*?)\s*\|\s*(\w+)\s*\|\s*(\d+)\s*\|\s*(.*?)\s*\|\s*(.*?)\s*\|$",
    )
    .expect("row pattern is valid")
});

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!-- meta: (.*) -->$").expect("meta pattern is valid"));

#[derive(Debug, Default, Serialize, Deserialize)]
struct Meta {
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    active_task_ids: Vec<TaskId>,
    #[serde(default)]
    review_done: bool,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    tasks: BTreeMap<TaskId, TaskMeta>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskMeta {
    #[serde(default)]
    fail_history: Vec<String>,
    #[serde(default)]
    timestamps: Option<TaskTimestamps>,
}

/// Escape a value for a single table cell.
fn cell(value: &str) -> String {
    let flat = value.replace('|', "∣").replace(['\r', '\n'], " ");
    let flat = flat.trim();
    if flat.is_empty() {
        "-".to_string()
    } else {
        flat.to_string()
    }
}

fn uncell(value: &str) -> String {
    if value == "-" {
        String::new()
    } else {
        value.to_string()
    }
}

/// Render `state` as a progress document.
pub fn render(state: &WorkflowState) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", state.name.trim()));
    out.push_str(&format!("Status: {}\n\n", state.status));
    out.push_str(TABLE_HEADER);
    out.push('\n');
    out.push_str(TABLE_RULE);
    out.push('\n');

    for task in &state.tasks {
        let deps = if task.deps.is_empty() {
            "-".to_string()
        } else {
            task.deps.join(",")
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            task.id,
            cell(&task.title),
            task.category,
            deps,
            task.status,
            task.retries,
            cell(&task.summary),
            cell(&task.description),
        ));
    }

    let meta = Meta {
        started_at: Some(state.started_at),
        active_task_ids: state.active_task_ids.clone(),
        review_done: state.review_done,
        verified: state.verified,
        tasks: state
            .tasks
            .iter()
            .map(|t| {
                (
                    t.id.clone(),
                    TaskMeta {
                        fail_history: t.fail_history.clone(),
                        timestamps: Some(t.timestamps.clone()),
                    },
                )
            })
            .collect(),
    };
    // Serializing plain data into a String cannot fail; keep the document
    // writable even if it somehow does.
    let json = serde_json::to_string(&meta).unwrap_or_else(|_| "{}".to_string());
    out.push_str(&format!("\n<!-- meta: {json} -->\n"));
    out
}

/// Parse a progress document.
///
/// Returns `None` when the text has no `# <name>` title line.
pub fn parse(text: &str) -> Option<WorkflowState> {
    let mut name: Option<String> = None;
    let mut status = WorkflowStatus::Idle;
    let mut rows: Vec<Task> = Vec::new();
    let mut meta = Meta::default();

    for line in text.lines().map(str::trim) {
        if name.is_none() {
            if let Some(title) = line.strip_prefix("# ") {
                name = Some(title.trim().to_string());
            }
            continue;
        }

        if let Some(value) = line.strip_prefix("Status:") {
            status = value.parse().unwrap_or(WorkflowStatus::Idle);
        } else if let Some(caps) = META_RE.captures(line) {
            match serde_json::from_str::<Meta>(&caps[1]) {
                Ok(parsed) => meta = parsed,
                Err(err) => warn!(error = %err, "ignoring unreadable meta annotation"),
            }
        } else if let Some(caps) = ROW_RE.captures(line) {
            rows.push(parse_row(&caps));
        }
    }

    let name = name?;
    let started_at = meta.started_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    for task in rows.iter_mut() {
        task.timestamps = TaskTimestamps::created_at(started_at);
        if let Some(task_meta) = meta.tasks.remove(&task.id) {
            task.fail_history = task_meta.fail_history;
            if let Some(ts) = task_meta.timestamps {
                task.timestamps = ts;
            }
        }
    }

    Some(WorkflowState {
        name,
        status,
        started_at,
        active_task_ids: meta.active_task_ids,
        tasks: rows,
        review_done: meta.review_done,
        verified: meta.verified,
    })
}

fn parse_row(caps: &regex::Captures<'_>) -> Task {
    let deps = caps[4]
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != "-")
        .map(str::to_string)
        .collect();

    Task {
        id: caps[1].to_string(),
        title: uncell(&caps[2]),
        description: uncell(&caps[8]),
        category: TaskCategory::parse_lenient(&caps[3]),
        status: caps[5].parse().unwrap_or(TaskStatus::Pending),
        deps,
        summary: uncell(&caps[7]),
        retries: caps[6].parse().unwrap_or(0),
        fail_history: Vec::new(),
        timestamps: TaskTimestamps::created_at(DateTime::<Utc>::UNIX_EPOCH),
    }
}
