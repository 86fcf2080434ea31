// src/service/workflow.rs

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::collab::CommitRequest;
use crate::dag::{cascade_skip, detect_cycles, stale_active_tasks, Dispatch, Scheduler};
use crate::definition::{validate_definition, WorkflowDefinition};
use crate::errors::{Result, TaskweaveError};
use crate::model::task::MANUAL_SKIP_REASON;
use crate::model::{FailOutcome, Task, WorkflowState};
use crate::service::reports::{
    AddReport, CheckpointInput, CheckpointReport, CommitStatus, DispatchedTask, EditReport,
    HistoryReport, InitReport, NextReport, SkipReport, StatusReport, TaskDetail,
};
use crate::service::WorkflowService;
use crate::store::{Heartbeat, HistoryEntry, HistoryEvent, WorkflowRepository};
use crate::summary::{build_summary, seed_summary};
use crate::types::{TaskCategory, TaskId, TaskStatus, WorkflowStatus};

/// Longest summary line recorded for a completed task.
const SUMMARY_LINE_CHARS: usize = 80;

/// Separator between context sections handed to a worker.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Changes applied by `edit`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<TaskId>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.deps.is_none()
    }
}

/// A task appended by `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub category: TaskCategory,
    pub description: String,
    pub deps: Vec<TaskId>,
}

/// Order-preserving de-duplication.
fn dedup_ids(ids: &[TaskId]) -> Vec<TaskId> {
    let mut out: Vec<TaskId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

fn summary_line(detail: &str) -> String {
    detail
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .chars()
        .take(SUMMARY_LINE_CHARS)
        .collect()
}

fn ensure_deps_exist(state: &WorkflowState, deps: &[TaskId]) -> Result<()> {
    match deps.iter().find(|d| !state.contains(d)) {
        Some(missing) => Err(TaskweaveError::TaskNotFound(missing.clone())),
        None => Ok(()),
    }
}

impl<R: WorkflowRepository> WorkflowService<R> {
    /// Create a workflow from definition text.
    ///
    /// An existing workflow is only replaced with `force`; its config is kept.
    /// Nothing is written when the definition is invalid.
    pub fn init(&self, raw: &str, force: bool) -> Result<InitReport> {
        self.with_lock(|cfg| {
            let existing = self.repo.load_progress()?;
            if let Some(existing) = &existing {
                if !force {
                    return Err(TaskweaveError::WorkflowExists(existing.name.clone()));
                }
            }

            let def = self.parser.parse(raw)?;
            let report = validate_definition(&def);
            if !report.is_ok() {
                return Err(TaskweaveError::Definition(report.errors));
            }

            if existing.is_some() {
                info!("replacing existing workflow");
                let keep = self.repo.has_config()?.then(|| cfg.raw().clone());
                self.repo.clear()?;
                if let Some(raw_cfg) = keep {
                    self.repo.save_config(&raw_cfg)?;
                }
            }

            let state = build_initial_state(&def);
            self.repo.save_progress(&state)?;
            self.repo.save_definition(raw)?;
            self.repo
                .save_summary(&seed_summary(&def.name, &def.description))?;
            if !self.repo.has_config()? {
                self.repo.save_config(cfg.raw())?;
            }
            self.repo
                .append_history(&HistoryEntry::new(HistoryEvent::Init, def.name.clone()))?;

            info!(workflow = %def.name, tasks = def.tasks.len(), "workflow initialized");
            Ok(InitReport {
                name: def.name,
                task_count: state.tasks.len(),
                warnings: report.warnings,
            })
        })
    }

    /// Check out the next eligible task.
    pub fn next(&self) -> Result<NextReport> {
        self.dispatch(false)
    }

    /// Check out every eligible task, bounded by `max_parallel`.
    pub fn next_batch(&self) -> Result<NextReport> {
        self.dispatch(true)
    }

    fn dispatch(&self, batch: bool) -> Result<NextReport> {
        self.with_lock(|cfg| {
            let mut state = self.require_progress()?;
            let scheduler = Scheduler::from_config(cfg);
            let now = Utc::now();
            let step: Dispatch = if batch {
                scheduler.dispatch_batch(&mut state, now)?
            } else {
                scheduler.dispatch_next(&mut state, now)?
            };

            // Persist even when nothing was dispatched: the cascade or the
            // move to `finishing` may have changed the state.
            self.repo.save_progress(&state)?;

            if !step.dispatched.is_empty() {
                self.repo
                    .save_heartbeat(&Heartbeat::now("next", &state.active_task_ids))?;
                let entry = match step.dispatched.as_slice() {
                    [single] if !batch => {
                        let title = state.task(single)?.title.clone();
                        HistoryEntry::for_task(HistoryEvent::Next, single.clone(), title)
                    }
                    ids => HistoryEntry::new(HistoryEvent::Next, format!("batch: {}", ids.join(","))),
                };
                self.repo.append_history(&entry)?;
            }

            let summary = self.repo.load_summary()?;
            let mut tasks = Vec::with_capacity(step.dispatched.len());
            for id in &step.dispatched {
                let task = state.task(id)?.clone();
                let context = self.context_for(&task, summary.as_deref())?;
                tasks.push(DispatchedTask { task, context });
            }

            Ok(NextReport {
                tasks,
                newly_skipped: step.newly_skipped,
                all_finished: state.status == WorkflowStatus::Finishing,
            })
        })
    }

    fn context_for(&self, task: &Task, summary: Option<&str>) -> Result<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
            parts.push(summary.trim_end().to_string());
        }
        for dep in &task.deps {
            if let Some(output) = self.repo.load_task_output(dep)? {
                if !output.trim().is_empty() {
                    parts.push(output.trim_end().to_string());
                }
            }
        }
        Ok(parts.join(CONTEXT_SEPARATOR))
    }

    /// Record the outcome of an active task.
    pub fn checkpoint(&self, id: &str, input: CheckpointInput) -> Result<CheckpointReport> {
        self.with_lock(|cfg| {
            let mut state = self.require_progress()?;
            let status = state.task(id)?.status;
            if status != TaskStatus::Active {
                return Err(TaskweaveError::InvalidState(format!(
                    "task {id} is {status}; only active tasks can be checkpointed"
                )));
            }
            let now = Utc::now();

            match input {
                CheckpointInput::Failure { reason } => {
                    let outcome = state.task_mut(id)?.fail(&reason, cfg.max_retries(), now)?;
                    state.release_active(id);
                    let report = match outcome {
                        FailOutcome::Retry { attempt } => CheckpointReport::Retrying {
                            id: id.to_string(),
                            attempt,
                            max_retries: cfg.max_retries(),
                        },
                        FailOutcome::Exhausted { attempts } => {
                            let newly_skipped = cascade_skip(&mut state.tasks);
                            state.settle();
                            CheckpointReport::Failed {
                                id: id.to_string(),
                                attempts,
                                newly_skipped,
                                all_finished: state.status == WorkflowStatus::Finishing,
                            }
                        }
                    };
                    self.repo.save_progress(&state)?;
                    self.repo
                        .save_heartbeat(&Heartbeat::now("checkpoint", &state.active_task_ids))?;
                    self.repo
                        .append_history(&HistoryEntry::for_task(HistoryEvent::Fail, id, reason))?;
                    warn!(task = %id, "task attempt failed");
                    Ok(report)
                }
                CheckpointInput::Success { detail, files } => {
                    if detail.trim().is_empty() {
                        return Err(TaskweaveError::InvalidState(format!(
                            "checkpoint detail for task {id} is empty"
                        )));
                    }
                    let line = summary_line(&detail);
                    let title = {
                        let task = state.task_mut(id)?;
                        task.complete(line.clone(), now)?;
                        task.title.clone()
                    };
                    state.release_active(id);
                    state.settle();

                    self.repo.save_progress(&state)?;
                    self.repo.save_task_output(
                        id,
                        &format!("# task-{id}: {title}\n\n{}\n", detail.trim_end()),
                    )?;
                    self.repo.save_summary(&build_summary(
                        &state.name,
                        &state.tasks,
                        cfg.summary_compress_threshold(),
                    ))?;

                    let commit = if cfg.auto_commit() {
                        let request = CommitRequest {
                            task_id: id.to_string(),
                            title,
                            summary: line.clone(),
                            files,
                        };
                        match self.committer.commit(&request) {
                            Ok(()) => CommitStatus::Committed,
                            Err(err) => {
                                warn!(task = %id, error = %err, "auto-commit failed");
                                CommitStatus::Failed(format!("{err:#}"))
                            }
                        }
                    } else {
                        CommitStatus::Disabled
                    };

                    self.repo
                        .save_heartbeat(&Heartbeat::now("checkpoint", &state.active_task_ids))?;
                    self.repo
                        .append_history(&HistoryEntry::for_task(HistoryEvent::Checkpoint, id, line))?;

                    let counts = state.counts();
                    info!(task = %id, done = counts.done, total = counts.total(), "task completed");
                    Ok(CheckpointReport::Completed {
                        id: id.to_string(),
                        done: counts.done,
                        total: counts.total(),
                        commit,
                        all_finished: state.status == WorkflowStatus::Finishing,
                    })
                }
            }
        })
    }

    /// Mark a task skipped by hand. Dependents are cascade-skipped.
    pub fn skip(&self, id: &str) -> Result<SkipReport> {
        self.with_lock(|_cfg| {
            let mut state = self.require_progress()?;
            let task = state.task_mut(id)?;
            if task.status.is_terminal() {
                return Ok(SkipReport::AlreadyTerminal {
                    id: id.to_string(),
                    status: task.status,
                });
            }
            let was_active = task.status == TaskStatus::Active;
            let title = task.title.clone();
            task.skip(MANUAL_SKIP_REASON)?;
            state.release_active(id);

            let newly_skipped = cascade_skip(&mut state.tasks);
            state.settle();
            self.repo.save_progress(&state)?;
            self.repo
                .append_history(&HistoryEntry::for_task(HistoryEvent::Skip, id, title.clone()))?;

            if was_active {
                warn!(task = %id, "skipped an active task; its worker may still be running");
            }
            Ok(SkipReport::Skipped {
                id: id.to_string(),
                title,
                was_active,
                newly_skipped,
            })
        })
    }

    /// Change a pending task. Rejected if the new deps would form a cycle.
    pub fn edit(&self, id: &str, update: TaskUpdate) -> Result<EditReport> {
        if update.is_empty() {
            return Err(TaskweaveError::InvalidState(
                "nothing to edit; pass at least one of --title, --description, --category, --deps"
                    .to_string(),
            ));
        }

        self.with_lock(|_cfg| {
            let state = self.require_progress()?;
            let status = state.task(id)?.status;
            if status != TaskStatus::Pending {
                return Err(TaskweaveError::InvalidState(format!(
                    "only pending tasks can be edited (task {id} is {status})"
                )));
            }

            let deps = update.deps.as_deref().map(dedup_ids);
            if let Some(deps) = &deps {
                ensure_deps_exist(&state, deps)?;
                if deps.iter().any(|d| d == id) {
                    return Err(TaskweaveError::InvalidState(format!(
                        "task {id} cannot depend on itself"
                    )));
                }
            }

            let mut edited = state.clone();
            {
                let task = edited.task_mut(id)?;
                if let Some(title) = &update.title {
                    task.title = title.clone();
                }
                if let Some(description) = &update.description {
                    task.description = description.clone();
                }
                if let Some(category) = update.category {
                    task.category = category;
                }
                if let Some(deps) = deps {
                    task.deps = deps;
                }
            }
            if let Some(cycle) = detect_cycles(&edited.tasks) {
                return Err(TaskweaveError::DependencyCycle(cycle));
            }

            self.repo.save_progress(&edited)?;
            let detail = serde_json::to_string(&update)?;
            self.repo
                .append_history(&HistoryEntry::for_task(HistoryEvent::Edit, id, detail))?;
            Ok(EditReport { id: id.to_string() })
        })
    }

    /// Append a task. A `finishing` workflow goes back to `running`.
    pub fn add(&self, new_task: NewTask) -> Result<AddReport> {
        let title = new_task.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskweaveError::InvalidState("task title is empty".to_string()));
        }

        self.with_lock(|_cfg| {
            let mut state = self.require_progress()?;
            let deps = dedup_ids(&new_task.deps);
            ensure_deps_exist(&state, &deps)?;

            let id = state.next_task_id();
            let mut task = Task::new(id.clone(), title.clone(), new_task.category, Utc::now());
            task.description = new_task.description.clone();
            task.deps = deps;
            state.tasks.push(task);

            let reopened = state.status == WorkflowStatus::Finishing;
            if reopened {
                state.status = WorkflowStatus::Running;
            }
            state.clear_finalize_flags();

            self.repo.save_progress(&state)?;
            self.repo
                .append_history(&HistoryEntry::for_task(HistoryEvent::Add, id.clone(), title.clone()))?;
            info!(task = %id, reopened, "task added");
            Ok(AddReport { id, title, reopened })
        })
    }

    /// Details and produced output of one task.
    pub fn show(&self, id: &str) -> Result<TaskDetail> {
        let cfg = self.repo.load_config()?;
        let state = self.require_progress()?;
        let task = state.task(id)?.clone();
        let output = self.repo.load_task_output(id)?;
        Ok(TaskDetail {
            task,
            output,
            max_retries: cfg.max_retries(),
        })
    }

    /// The last `limit` history entries (all of them when `None`).
    pub fn log(&self, limit: Option<usize>) -> Result<HistoryReport> {
        let mut entries = self.repo.load_history()?;
        if let Some(limit) = limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }
        Ok(HistoryReport { entries })
    }

    /// Current state, or `None` when no workflow exists.
    ///
    /// With `stale_after`, active tasks checked out for longer are listed.
    pub fn status(&self, stale_after: Option<Duration>) -> Result<Option<StatusReport>> {
        let Some(state) = self.repo.load_progress()? else {
            return Ok(None);
        };
        let stale = stale_after
            .map(|max_age| stale_active_tasks(&state.tasks, Utc::now(), max_age))
            .unwrap_or_default();
        Ok(Some(StatusReport {
            counts: state.counts(),
            state,
            stale,
        }))
    }
}

fn build_initial_state(def: &WorkflowDefinition) -> WorkflowState {
    let now = Utc::now();
    let mut state = WorkflowState::new(def.name.clone(), now);
    state.tasks = def
        .tasks
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut task = Task::new(WorkflowDefinition::id_of(i), spec.title.clone(), spec.category, now);
            task.description = spec.description.clone();
            task.deps = dedup_ids(&spec.deps);
            task
        })
        .collect();
    state
}
