#![allow(dead_code)]

use taskweave::model::WorkflowState;
use taskweave::service::{CheckpointInput, CheckpointReport, WorkflowService};
use taskweave::store::{MemoryRepository, WorkflowRepository};
use taskweave::types::TaskStatus;
use taskweave_test_utils::fakes::{FakeCommitter, FakeVerifier};
use taskweave_test_utils::init_tracing;

/// Chain of three tasks: 002 needs 001, 003 needs 002.
pub const CHAIN: &str = "\
# Demo
A small demo
1. [backend] A
2. [frontend] B (deps: 1)
3. [general] C (deps: 2)
";

/// Two independent roots and one join.
pub const DIAMOND: &str = "\
# Diamond
1. [backend] A
2. [frontend] B
3. [general] C (deps: 1, 2)
";

pub const SINGLE: &str = "\
# One
1. [general] Only
";

/// Service over an in-memory repository with recording fakes.
pub struct Harness {
    pub service: WorkflowService<MemoryRepository>,
    pub repo: MemoryRepository,
    pub committer: FakeCommitter,
    pub verifier: FakeVerifier,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let repo = MemoryRepository::new();
        let committer = FakeCommitter::new();
        let verifier = FakeVerifier::passing();
        let service = WorkflowService::new(
            repo.clone(),
            Box::new(committer.clone()),
            Box::new(verifier.clone()),
        );
        Self {
            service,
            repo,
            committer,
            verifier,
        }
    }

    pub fn with_definition(definition: &str) -> Self {
        let harness = Self::new();
        harness.service.init(definition, false).unwrap();
        harness
    }

    pub fn state(&self) -> WorkflowState {
        self.repo.load_progress().unwrap().expect("workflow exists")
    }

    pub fn status_of(&self, id: &str) -> TaskStatus {
        self.state().task(id).unwrap().status
    }

    pub fn complete(&self, id: &str, detail: &str) -> CheckpointReport {
        self.service
            .checkpoint(
                id,
                CheckpointInput::Success {
                    detail: detail.to_string(),
                    files: None,
                },
            )
            .unwrap()
    }

    pub fn fail(&self, id: &str, reason: &str) -> CheckpointReport {
        self.service
            .checkpoint(
                id,
                CheckpointInput::Failure {
                    reason: reason.to_string(),
                },
            )
            .unwrap()
    }

    /// Dispatch and complete tasks one at a time until nothing is left.
    pub fn run_to_end(&self) {
        loop {
            let report = self.service.next().unwrap();
            let Some(dispatched) = report.tasks.first() else {
                break;
            };
            let id = dispatched.task.id.clone();
            self.complete(&id, &format!("finished {id}"));
        }
    }
}
