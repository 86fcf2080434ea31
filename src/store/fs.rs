// src/store/fs.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::{self, Config, RawConfig, CONFIG_FILE_NAME};
use crate::errors::{Result, TaskweaveError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::lock::{FileLock, LivenessProbe, LockOptions, ProcessLiveness, LOCK_FILE_NAME};
use crate::model::WorkflowState;
use crate::store::document;
use crate::store::heartbeat::Heartbeat;
use crate::store::history::{self, HistoryEntry};

const PROGRESS_FILE: &str = "progress.md";
const DEFINITION_FILE: &str = "definition.md";
const HISTORY_FILE: &str = "history.jsonl";
const HEARTBEAT_FILE: &str = "heartbeat.json";
const CONTEXT_DIR: &str = "context";
const SUMMARY_FILE: &str = "summary.md";

/// Replace `path` with `contents` so readers see the old or the new file,
/// never a partial one: write a uniquely named sibling, then rename it.
pub fn write_atomic(fs: &dyn FileSystem, path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.{}.{nanos}.tmp", std::process::id()));

    fs.write(&tmp, contents)?;
    if let Err(err) = fs.rename(&tmp, path) {
        if let Err(cleanup) = fs.remove_file(&tmp) {
            warn!(path = ?tmp, error = %cleanup, "failed to remove temporary file");
        }
        return Err(err.into());
    }
    Ok(())
}

/// Repository storing each concern in its own file under a state directory.
#[derive(Debug, Clone)]
pub struct FsRepository<F: FileSystem + Clone = RealFileSystem> {
    fs: F,
    dir: PathBuf,
    lock: FileLock<F>,
}

impl FsRepository<RealFileSystem> {
    /// Repository over the real filesystem with OS liveness probing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_fs(RealFileSystem, dir, Arc::new(ProcessLiveness))
    }
}

impl<F: FileSystem + Clone> FsRepository<F> {
    pub fn with_fs(fs: F, dir: impl Into<PathBuf>, liveness: Arc<dyn LivenessProbe>) -> Self {
        let dir = dir.into();
        let lock = FileLock::new(fs.clone(), dir.join(LOCK_FILE_NAME), liveness);
        Self { fs, dir, lock }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn task_output_path(&self, id: &str) -> PathBuf {
        self.dir.join(CONTEXT_DIR).join(format!("task-{id}.md"))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        debug!(path = ?path, bytes = contents.len(), "writing state file");
        write_atomic(&self.fs, path, contents.as_bytes())
    }
}

impl<F: FileSystem + Clone> crate::store::WorkflowRepository for FsRepository<F> {
    fn load_progress(&self) -> Result<Option<WorkflowState>> {
        let Some(text) = self.fs.read_optional(&self.path(PROGRESS_FILE))? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        document::parse(&text).map(Some).ok_or_else(|| {
            TaskweaveError::InvalidState(format!(
                "{} has no workflow title line",
                self.path(PROGRESS_FILE).display()
            ))
        })
    }

    fn save_progress(&self, state: &WorkflowState) -> Result<()> {
        self.write(&self.path(PROGRESS_FILE), &document::render(state))
    }

    fn save_definition(&self, raw: &str) -> Result<()> {
        self.write(&self.path(DEFINITION_FILE), raw)
    }

    fn load_definition(&self) -> Result<Option<String>> {
        Ok(self.fs.read_optional(&self.path(DEFINITION_FILE))?)
    }

    fn save_task_output(&self, id: &str, content: &str) -> Result<()> {
        self.write(&self.task_output_path(id), content)
    }

    fn load_task_output(&self, id: &str) -> Result<Option<String>> {
        Ok(self.fs.read_optional(&self.task_output_path(id))?)
    }

    fn save_summary(&self, content: &str) -> Result<()> {
        self.write(&self.dir.join(CONTEXT_DIR).join(SUMMARY_FILE), content)
    }

    fn load_summary(&self) -> Result<Option<String>> {
        Ok(self
            .fs
            .read_optional(&self.dir.join(CONTEXT_DIR).join(SUMMARY_FILE))?)
    }

    fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        self.fs.append(&self.path(HISTORY_FILE), line.as_bytes())?;
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .fs
            .read_optional(&self.path(HISTORY_FILE))?
            .map(|text| history::parse_lines(&text))
            .unwrap_or_default())
    }

    fn save_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()> {
        self.write(&self.path(HEARTBEAT_FILE), &serde_json::to_string_pretty(heartbeat)?)
    }

    fn load_heartbeat(&self) -> Result<Option<Heartbeat>> {
        match self.fs.read_optional(&self.path(HEARTBEAT_FILE))? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn load_config(&self) -> Result<Config> {
        config::load_config(&self.fs, &self.path(CONFIG_FILE_NAME))
    }

    fn save_config(&self, raw: &RawConfig) -> Result<()> {
        let mut text = serde_json::to_string_pretty(raw)?;
        text.push('\n');
        self.write(&self.path(CONFIG_FILE_NAME), &text)
    }

    fn has_config(&self) -> Result<bool> {
        Ok(self.fs.exists(&self.path(CONFIG_FILE_NAME)))
    }

    fn lock(&self, opts: &LockOptions) -> Result<()> {
        self.lock.acquire(opts)
    }

    fn unlock(&self) {
        self.lock.release();
    }

    fn clear(&self) -> Result<()> {
        let lock_path = self.lock.path();
        let reclaim_path = self.lock.reclaim_path();
        for entry in self.fs.read_dir(&self.dir)? {
            if entry == lock_path || entry == reclaim_path {
                continue;
            }
            self.fs.remove_all(&entry)?;
        }
        debug!(dir = ?self.dir, "cleared workflow state");
        Ok(())
    }
}
