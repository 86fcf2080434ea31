// src/service/mod.rs

//! Workflow operations.
//!
//! [`WorkflowService`] composes a [`WorkflowRepository`], the graph
//! algorithms in [`crate::dag`] and the collaborators in [`crate::collab`].
//! Every mutating operation loads the config, takes the state lock, reloads
//! the workflow, applies one transition and persists it before unlocking.
//!
//! - [`workflow`] holds setup, dispatch, checkpoint and task editing.
//! - [`finalize`] holds pause, resume, review and the two-phase finish.
//! - [`reports`] holds the operation results.

pub mod finalize;
pub mod reports;
pub mod workflow;

use std::path::Path;

use tracing::debug;

use crate::collab::{CommandVerifier, Committer, GitCommitter, Verifier};
use crate::config::Config;
use crate::definition::{DefinitionParser, MarkdownParser};
use crate::errors::{Result, TaskweaveError};
use crate::lock::LockOptions;
use crate::model::WorkflowState;
use crate::store::{FsRepository, WorkflowRepository, STATE_DIR_NAME};

pub use reports::{
    AddReport, CheckpointInput, CheckpointReport, CommitStatus, DispatchedTask, EditReport,
    FinishOutcome, HistoryReport, InitReport, NextReport, PauseReport, ResumeReport, ReviewReport,
    SkipReport, StatusReport, TaskDetail,
};
pub use workflow::{NewTask, TaskUpdate};

pub struct WorkflowService<R: WorkflowRepository> {
    repo: R,
    committer: Box<dyn Committer>,
    verifier: Box<dyn Verifier>,
    parser: Box<dyn DefinitionParser>,
}

impl WorkflowService<FsRepository> {
    /// Service over `<root>/.taskweave` with git commits and shell
    /// verification run in `root`. The state directory is never committed.
    pub fn for_project(root: &Path) -> Self {
        Self::new(
            FsRepository::new(root.join(STATE_DIR_NAME)),
            Box::new(GitCommitter::new(root).exclude(STATE_DIR_NAME)),
            Box::new(CommandVerifier::new(root)),
        )
    }
}

impl<R: WorkflowRepository> WorkflowService<R> {
    pub fn new(repo: R, committer: Box<dyn Committer>, verifier: Box<dyn Verifier>) -> Self {
        Self {
            repo,
            committer,
            verifier,
            parser: Box::new(MarkdownParser),
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn DefinitionParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Run `op` with the state lock held. The lock is released whether or
    /// not `op` succeeds.
    fn with_lock<T>(&self, op: impl FnOnce(&Config) -> Result<T>) -> Result<T> {
        let cfg = self.repo.load_config()?;
        self.repo.lock(&LockOptions::from_config(&cfg))?;
        debug!("state lock held");
        let result = op(&cfg);
        self.repo.unlock();
        result
    }

    fn require_progress(&self) -> Result<WorkflowState> {
        self.repo.load_progress()?.ok_or(TaskweaveError::NoWorkflow)
    }
}
