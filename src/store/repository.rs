// src/store/repository.rs

use crate::config::{Config, RawConfig};
use crate::errors::Result;
use crate::lock::LockOptions;
use crate::model::WorkflowState;
use crate::store::heartbeat::Heartbeat;
use crate::store::history::HistoryEntry;

/// Everything the workflow service persists.
///
/// Absent data is `Ok(None)` / empty / defaults, never an error. Mutating
/// callers bracket their work with [`lock`](Self::lock) and
/// [`unlock`](Self::unlock).
pub trait WorkflowRepository {
    fn load_progress(&self) -> Result<Option<WorkflowState>>;
    fn save_progress(&self, state: &WorkflowState) -> Result<()>;

    /// Raw definition text as given to `init`.
    fn save_definition(&self, raw: &str) -> Result<()>;
    fn load_definition(&self) -> Result<Option<String>>;

    /// Content produced by a task, written on successful checkpoint.
    fn save_task_output(&self, id: &str, content: &str) -> Result<()>;
    fn load_task_output(&self, id: &str) -> Result<Option<String>>;

    fn save_summary(&self, content: &str) -> Result<()>;
    fn load_summary(&self) -> Result<Option<String>>;

    fn append_history(&self, entry: &HistoryEntry) -> Result<()>;
    fn load_history(&self) -> Result<Vec<HistoryEntry>>;

    fn save_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()>;
    fn load_heartbeat(&self) -> Result<Option<Heartbeat>>;

    /// Validated config; defaults when none has been saved.
    fn load_config(&self) -> Result<Config>;
    fn save_config(&self, raw: &RawConfig) -> Result<()>;
    fn has_config(&self) -> Result<bool>;

    fn lock(&self, opts: &LockOptions) -> Result<()>;
    fn unlock(&self);

    /// Delete all persisted state except the lock.
    fn clear(&self) -> Result<()>;
}
