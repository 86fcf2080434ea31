// src/store/memory.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use crate::config::{Config, RawConfig};
use crate::errors::{Result, TaskweaveError};
use crate::lock::LockOptions;
use crate::model::WorkflowState;
use crate::store::heartbeat::Heartbeat;
use crate::store::history::HistoryEntry;
use crate::store::repository::WorkflowRepository;

#[derive(Debug, Default)]
struct Inner {
    progress: Option<WorkflowState>,
    definition: Option<String>,
    outputs: BTreeMap<String, String>,
    summary: Option<String>,
    history: Vec<HistoryEntry>,
    heartbeat: Option<Heartbeat>,
    config: Option<RawConfig>,
    locked: bool,
}

/// In-process repository. Clones share the same state, so a test can keep a
/// handle while the service owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the guard leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_locked(&self) -> bool {
        self.inner().locked
    }

    /// Whether any state besides the lock flag is stored.
    pub fn is_empty(&self) -> bool {
        let inner = self.inner();
        inner.progress.is_none()
            && inner.definition.is_none()
            && inner.outputs.is_empty()
            && inner.summary.is_none()
            && inner.history.is_empty()
            && inner.heartbeat.is_none()
            && inner.config.is_none()
    }
}

impl WorkflowRepository for MemoryRepository {
    fn load_progress(&self) -> Result<Option<WorkflowState>> {
        Ok(self.inner().progress.clone())
    }

    fn save_progress(&self, state: &WorkflowState) -> Result<()> {
        self.inner().progress = Some(state.clone());
        Ok(())
    }

    fn save_definition(&self, raw: &str) -> Result<()> {
        self.inner().definition = Some(raw.to_string());
        Ok(())
    }

    fn load_definition(&self) -> Result<Option<String>> {
        Ok(self.inner().definition.clone())
    }

    fn save_task_output(&self, id: &str, content: &str) -> Result<()> {
        self.inner().outputs.insert(id.to_string(), content.to_string());
        Ok(())
    }

    fn load_task_output(&self, id: &str) -> Result<Option<String>> {
        Ok(self.inner().outputs.get(id).cloned())
    }

    fn save_summary(&self, content: &str) -> Result<()> {
        self.inner().summary = Some(content.to_string());
        Ok(())
    }

    fn load_summary(&self) -> Result<Option<String>> {
        Ok(self.inner().summary.clone())
    }

    fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.inner().history.push(entry.clone());
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.inner().history.clone())
    }

    fn save_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()> {
        self.inner().heartbeat = Some(heartbeat.clone());
        Ok(())
    }

    fn load_heartbeat(&self) -> Result<Option<Heartbeat>> {
        Ok(self.inner().heartbeat.clone())
    }

    fn load_config(&self) -> Result<Config> {
        match self.inner().config.clone() {
            Some(raw) => Config::try_from(raw),
            None => Ok(Config::default()),
        }
    }

    fn save_config(&self, raw: &RawConfig) -> Result<()> {
        self.inner().config = Some(raw.clone());
        Ok(())
    }

    fn has_config(&self) -> Result<bool> {
        Ok(self.inner().config.is_some())
    }

    fn lock(&self, opts: &LockOptions) -> Result<()> {
        let started = Instant::now();
        loop {
            {
                let mut inner = self.inner();
                if !inner.locked {
                    inner.locked = true;
                    return Ok(());
                }
            }
            let waited = started.elapsed();
            if waited >= opts.max_wait {
                return Err(TaskweaveError::LockTimeout {
                    path: PathBuf::from("<memory>"),
                    waited_ms: waited.as_millis(),
                });
            }
            thread::sleep(opts.poll_interval);
        }
    }

    fn unlock(&self) {
        self.inner().locked = false;
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner();
        let locked = inner.locked;
        *inner = Inner {
            locked,
            ..Inner::default()
        };
        Ok(())
    }
}
