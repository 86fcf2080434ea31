// src/service/finalize.rs

//! Pause / resume and the finalization gate.
//!
//! `finish` runs in two locked phases with verification in between, so a
//! long test suite never blocks other commands:
//!
//! 1. locked: check every task is terminal, move to `finishing`, read the
//!    `verified` flag;
//! 2. unlocked: run the verifier unless an earlier attempt already passed;
//! 3. locked again: reload, re-check, record `verified`, require review,
//!    commit, delete all state.

use tracing::{info, warn};

use crate::collab::CommitRequest;
use crate::errors::{Result, TaskweaveError};
use crate::model::WorkflowState;
use crate::service::reports::{FinishOutcome, PauseReport, ResumeReport, ReviewReport};
use crate::service::WorkflowService;
use crate::store::{Heartbeat, HistoryEntry, HistoryEvent, WorkflowRepository};
use crate::types::WorkflowStatus;

fn ensure_all_terminal(state: &WorkflowState) -> Result<()> {
    let open = state.tasks.iter().filter(|t| !t.is_terminal()).count();
    if open > 0 {
        return Err(TaskweaveError::InvalidState(format!(
            "{open} task(s) of '{}' are not finished yet",
            state.name
        )));
    }
    Ok(())
}

fn ensure_not_paused(state: &WorkflowState) -> Result<()> {
    if state.status == WorkflowStatus::Idle {
        return Err(TaskweaveError::InvalidState(format!(
            "workflow '{}' is paused; run `resume` first",
            state.name
        )));
    }
    Ok(())
}

impl<R: WorkflowRepository> WorkflowService<R> {
    /// Stop handing out work. Active tasks go back to `pending` and any
    /// finalization progress is forgotten.
    pub fn pause(&self) -> Result<PauseReport> {
        self.with_lock(|_cfg| {
            let mut state = self.require_progress()?;
            if state.status == WorkflowStatus::Idle {
                return Err(TaskweaveError::InvalidState(format!(
                    "workflow '{}' is already paused",
                    state.name
                )));
            }

            let reset = state.reset_active_tasks();
            state.status = WorkflowStatus::Idle;
            state.clear_finalize_flags();
            self.repo.save_progress(&state)?;
            self.repo
                .append_history(&HistoryEntry::new(HistoryEvent::Pause, "paused manually"))?;

            info!(workflow = %state.name, reset = ?reset, "workflow paused");
            Ok(PauseReport {
                name: state.name,
                reset,
            })
        })
    }

    /// Recover after an interruption: active tasks go back to `pending`.
    pub fn resume(&self) -> Result<ResumeReport> {
        self.with_lock(|cfg| {
            let Some(mut state) = self.repo.load_progress()? else {
                return Ok(ResumeReport::NoWorkflow);
            };
            if state.status == WorkflowStatus::Finishing {
                return Ok(ResumeReport::Finishing { name: state.name });
            }

            let from_idle = state.status == WorkflowStatus::Idle;
            let reset = state.reset_active_tasks();
            state.status = WorkflowStatus::Running;
            if from_idle {
                state.clear_finalize_flags();
            }
            self.repo.save_progress(&state)?;
            self.repo.save_heartbeat(&Heartbeat::now("resume", &[]))?;
            let detail = if reset.is_empty() {
                "reset: none".to_string()
            } else {
                format!("reset: {}", reset.join(","))
            };
            self.repo
                .append_history(&HistoryEntry::new(HistoryEvent::Resume, detail))?;

            if !reset.is_empty() && cfg.auto_commit() {
                if let Err(err) = self.committer.cleanup() {
                    warn!(error = %err, "could not set aside changes from interrupted tasks");
                }
                if let Err(err) = self.committer.prune_old(cfg.stash_keep()) {
                    warn!(error = %err, "could not prune old stash entries");
                }
            }

            let counts = state.counts();
            info!(workflow = %state.name, reset = ?reset, "workflow resumed");
            Ok(ResumeReport::Resumed {
                name: state.name,
                reset,
                done: counts.done,
                total: counts.total(),
            })
        })
    }

    /// Record that the finished work has been reviewed.
    pub fn review(&self) -> Result<ReviewReport> {
        self.with_lock(|_cfg| {
            let mut state = self.require_progress()?;
            ensure_all_terminal(&state)?;

            state.review_done = true;
            state.status = WorkflowStatus::Finishing;
            self.repo.save_progress(&state)?;
            self.repo
                .append_history(&HistoryEntry::new(HistoryEvent::Review, "review recorded"))?;
            Ok(ReviewReport { name: state.name })
        })
    }

    /// Verify, require review, commit and delete the workflow.
    pub fn finish(&self) -> Result<FinishOutcome> {
        let (cfg, verified) = self.with_lock(|cfg| {
            let mut state = self.require_progress()?;
            ensure_not_paused(&state)?;
            ensure_all_terminal(&state)?;
            if state.status != WorkflowStatus::Finishing {
                state.status = WorkflowStatus::Finishing;
                self.repo.save_progress(&state)?;
            }
            Ok((cfg.clone(), state.verified))
        })?;

        let scripts = if verified {
            info!("verification already passed in this finalize attempt");
            cfg.verify_commands().to_vec()
        } else {
            let result = self.verifier.verify(&cfg);
            if !result.passed {
                warn!(error = ?result.error, "verification failed");
                return Ok(FinishOutcome::VerificationFailed {
                    error: result
                        .error
                        .unwrap_or_else(|| "verification failed".to_string()),
                    scripts: result.scripts,
                });
            }
            result.scripts
        };

        self.with_lock(|cfg| {
            let mut state = self.require_progress()?;
            ensure_not_paused(&state)?;
            ensure_all_terminal(&state)?;

            if !state.verified {
                state.verified = true;
                self.repo.save_progress(&state)?;
            }
            if !state.review_done {
                return Ok(FinishOutcome::NeedsReview { scripts });
            }

            let counts = state.counts();
            if cfg.auto_commit() {
                let request = CommitRequest {
                    task_id: "finish".to_string(),
                    title: state.name.clone(),
                    summary: format!("done: {}/{}", counts.done, counts.total()),
                    files: None,
                };
                if let Err(err) = self.committer.commit(&request) {
                    warn!(error = %err, "final commit failed");
                    return Ok(FinishOutcome::CommitFailed {
                        error: format!("{err:#}"),
                    });
                }
            }

            self.repo.clear()?;
            info!(
                workflow = %state.name,
                done = counts.done,
                skipped = counts.skipped,
                failed = counts.failed,
                "workflow finished"
            );
            Ok(FinishOutcome::Completed {
                done: counts.done,
                skipped: counts.skipped,
                failed: counts.failed,
                scripts,
            })
        })
    }
}
