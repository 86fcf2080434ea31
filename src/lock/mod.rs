// src/lock/mod.rs

//! Cross-process mutual exclusion over the state directory.
//!
//! The lock is a file created with exclusive-create semantics holding
//! `"<pid>\n<unix-millis>\n"`. A holder that is dead, or alive but older than
//! the staleness bound, is reclaimed; a fresh live holder is waited on with a
//! fixed backoff until the wait bound expires.

pub mod liveness;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{Result, TaskweaveError};
use crate::fs::FileSystem;

pub use liveness::{LivenessProbe, ProcessLiveness};

/// Name of the lock file inside the state directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Delay between acquisition attempts while a live holder has the lock.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Identity of the process holding the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at_ms: i64,
}

impl LockHolder {
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.pid, self.acquired_at_ms)
    }

    /// `None` for anything that is not two integer lines.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines();
        let pid = lines.next()?.trim().parse().ok()?;
        let acquired_at_ms = lines.next()?.trim().parse().ok()?;
        Some(Self {
            pid,
            acquired_at_ms,
        })
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.acquired_at_ms)
    }
}

/// Timing knobs for [`FileLock::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Give up after waiting this long.
    pub max_wait: Duration,
    /// A live holder older than this is treated as abandoned.
    pub stale_after: Duration,
    pub poll_interval: Duration,
}

impl LockOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_wait: cfg.lock_timeout(),
            stale_after: cfg.lock_stale_after(),
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Suffix of the guard file that serialises reclamation of abandoned locks.
pub const RECLAIM_SUFFIX: &str = ".reclaim";

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Exclusive-create file lock.
///
/// Only the holder recorded by [`acquire`](Self::acquire) is ever removed by
/// [`release`](Self::release). Removing someone else's abandoned lock happens
/// under a second exclusive-create guard, so two waiters can never both
/// reclaim the same lock.
#[derive(Debug, Clone)]
pub struct FileLock<F: FileSystem> {
    fs: F,
    path: PathBuf,
    reclaim_path: PathBuf,
    liveness: Arc<dyn LivenessProbe>,
    held: Arc<Mutex<Option<LockHolder>>>,
}

impl<F: FileSystem> FileLock<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>, liveness: Arc<dyn LivenessProbe>) -> Self {
        let path = path.into();
        Self {
            fs,
            reclaim_path: sibling(&path, RECLAIM_SUFFIX),
            path,
            liveness,
            held: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reclaim_path(&self) -> &Path {
        &self.reclaim_path
    }

    /// Current holder, if the lock file exists and is readable.
    pub fn holder(&self) -> Result<Option<LockHolder>> {
        read_holder(&self.fs, &self.path)
    }

    fn held(&self) -> MutexGuard<'_, Option<LockHolder>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the lock is ours or `opts.max_wait` has elapsed.
    pub fn acquire(&self, opts: &LockOptions) -> Result<()> {
        let started = Instant::now();
        loop {
            let me = LockHolder::current();
            if self.fs.create_new(&self.path, me.render().as_bytes())? {
                *self.held() = Some(me);
                debug!(path = ?self.path, pid = me.pid, "lock acquired");
                return Ok(());
            }

            if let Some(holder) = self.holder()? {
                if let Some(reason) = self.abandoned(&holder, opts) {
                    if self.reclaim(&holder, reason, opts)? {
                        continue;
                    }
                }
            }

            let waited = started.elapsed();
            if waited >= opts.max_wait {
                return Err(TaskweaveError::LockTimeout {
                    path: self.path.clone(),
                    waited_ms: waited.as_millis(),
                });
            }
            thread::sleep(opts.poll_interval);
        }
    }

    /// Why `holder` no longer owns the lock, if it doesn't.
    fn abandoned(&self, holder: &LockHolder, opts: &LockOptions) -> Option<&'static str> {
        if !self.liveness.is_alive(holder.pid) {
            return Some("holder process is dead");
        }
        let age = holder.age_ms(Utc::now().timestamp_millis());
        if age > opts.stale_after.as_millis() as i64 {
            return Some("holder exceeded the staleness bound");
        }
        None
    }

    /// Remove the lock file if it still belongs to `judged`.
    ///
    /// Returns `true` when the caller should retry immediately.
    fn reclaim(&self, judged: &LockHolder, reason: &str, opts: &LockOptions) -> Result<bool> {
        let guard = LockHolder::current();
        if !self
            .fs
            .create_new(&self.reclaim_path, guard.render().as_bytes())?
        {
            self.clear_abandoned_guard(opts)?;
            return Ok(false);
        }

        let result = self.take_if_unchanged(judged, reason);
        if let Err(err) = self.fs.remove_file(&self.reclaim_path) {
            warn!(path = ?self.reclaim_path, error = %err, "failed to remove reclaim guard");
        }
        result
    }

    fn take_if_unchanged(&self, judged: &LockHolder, reason: &str) -> Result<bool> {
        if self.holder()? != Some(*judged) {
            debug!(path = ?self.path, "lock changed hands; not reclaiming");
            return Ok(true);
        }

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let tombstone = sibling(
            &self.path,
            &format!(".{}.{}.stale", std::process::id(), nanos),
        );
        if let Err(err) = self.fs.rename(&self.path, &tombstone) {
            if self.fs.exists(&self.path) {
                return Err(err.into());
            }
            debug!(path = ?self.path, "lock vanished before reclaim");
            return Ok(true);
        }

        let taken = self.fs.read_optional(&tombstone)?;
        if taken.as_deref().and_then(LockHolder::parse) == Some(*judged) {
            info!(path = ?self.path, pid = judged.pid, reason, "removed abandoned lock");
            self.fs.remove_file(&tombstone)?;
            return Ok(true);
        }

        // The file was replaced after the check: hand it back.
        warn!(path = ?self.path, "lock changed hands during reclaim; restoring it");
        let restored = match &taken {
            Some(contents) => self.fs.create_new(&self.path, contents.as_bytes())?,
            None => false,
        };
        if !restored {
            warn!(path = ?self.path, "could not restore the lock taken during reclaim");
        }
        self.fs.remove_file(&tombstone)?;
        Ok(false)
    }

    /// Drop a reclaim guard left behind by a dead or stuck reclaimer.
    fn clear_abandoned_guard(&self, opts: &LockOptions) -> Result<()> {
        if let Some(guard) = read_holder(&self.fs, &self.reclaim_path)? {
            if let Some(reason) = self.abandoned(&guard, opts) {
                warn!(path = ?self.reclaim_path, pid = guard.pid, reason, "removing abandoned reclaim guard");
                self.fs.remove_file(&self.reclaim_path)?;
            }
        }
        Ok(())
    }

    /// Best-effort release of a lock taken by [`acquire`](Self::acquire).
    ///
    /// The file is removed only if it still names this holder; a lock that
    /// was reclaimed by another process is left alone.
    pub fn release(&self) {
        let Some(mine) = self.held().take() else {
            warn!(path = ?self.path, "release called without holding the lock");
            return;
        };
        match self.holder() {
            Ok(Some(current)) if current == mine => match self.fs.remove_file(&self.path) {
                Ok(true) => debug!(path = ?self.path, "lock released"),
                Ok(false) => warn!(path = ?self.path, "lock file already gone on release"),
                Err(err) => warn!(path = ?self.path, error = %err, "failed to release lock"),
            },
            Ok(Some(current)) => warn!(
                path = ?self.path,
                pid = current.pid,
                "lock was reclaimed by another process; leaving it in place"
            ),
            Ok(None) => warn!(path = ?self.path, "lock file gone or unreadable on release"),
            Err(err) => warn!(path = ?self.path, error = %err, "failed to read lock on release"),
        }
    }
}

fn read_holder(fs: &impl FileSystem, path: &Path) -> Result<Option<LockHolder>> {
    Ok(fs
        .read_optional(path)?
        .as_deref()
        .and_then(LockHolder::parse))
}
