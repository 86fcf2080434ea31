#![allow(dead_code)]

//! Recording fakes for the service collaborators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use taskweave::collab::{CommitRequest, Committer, Verifier, VerifyResult};
use taskweave::config::Config;
use taskweave::lock::LivenessProbe;

/// Committer that records every call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct FakeCommitter {
    commits: Arc<Mutex<Vec<CommitRequest>>>,
    cleanups: Arc<Mutex<usize>>,
    prunes: Arc<Mutex<Vec<usize>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl FakeCommitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent commits fail with `message` (`None` to succeed again).
    pub fn fail_commits(&self, message: Option<&str>) {
        *self.fail_with.lock().unwrap() = message.map(str::to_string);
    }

    pub fn commits(&self) -> Vec<CommitRequest> {
        self.commits.lock().unwrap().clone()
    }

    pub fn cleanup_calls(&self) -> usize {
        *self.cleanups.lock().unwrap()
    }

    pub fn prune_calls(&self) -> Vec<usize> {
        self.prunes.lock().unwrap().clone()
    }
}

impl Committer for FakeCommitter {
    fn commit(&self, request: &CommitRequest) -> Result<()> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(anyhow!(message));
        }
        self.commits.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        *self.cleanups.lock().unwrap() += 1;
        Ok(())
    }

    fn prune_old(&self, max_keep: usize) -> Result<()> {
        self.prunes.lock().unwrap().push(max_keep);
        Ok(())
    }
}

/// Verifier returning a scripted result and counting calls.
#[derive(Debug, Clone)]
pub struct FakeVerifier {
    result: Arc<Mutex<VerifyResult>>,
    calls: Arc<Mutex<usize>>,
}

impl FakeVerifier {
    pub fn passing() -> Self {
        Self {
            result: Arc::new(Mutex::new(VerifyResult::passed(vec!["cargo test".to_string()]))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(error: &str) -> Self {
        let verifier = Self::passing();
        verifier.set_failing(error);
        verifier
    }

    pub fn set_failing(&self, error: &str) {
        *self.result.lock().unwrap() = VerifyResult::failed(vec!["cargo test".to_string()], error);
    }

    pub fn set_passing(&self) {
        *self.result.lock().unwrap() = VerifyResult::passed(vec!["cargo test".to_string()]);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Verifier for FakeVerifier {
    fn verify(&self, _cfg: &Config) -> VerifyResult {
        *self.calls.lock().unwrap() += 1;
        self.result.lock().unwrap().clone()
    }
}

/// Liveness probe with a fixed set of live pids.
#[derive(Debug, Clone, Default)]
pub struct StaticLiveness {
    alive: HashSet<u32>,
}

impl StaticLiveness {
    pub fn alive(pids: &[u32]) -> Self {
        Self {
            alive: pids.iter().copied().collect(),
        }
    }

    /// Every pid is dead.
    pub fn none() -> Self {
        Self::default()
    }
}

impl LivenessProbe for StaticLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.contains(&pid)
    }
}
