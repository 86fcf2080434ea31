// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration as read from `.taskweave/config.json`.
///
/// Every field is optional; a missing file or an empty object yields the
/// defaults:
///
/// ```json
/// {
///   "auto_commit": true,
///   "verify_commands": ["cargo build", "cargo test"],
///   "verify_timeout_ms": 300000,
///   "summary_compress_threshold": 50,
///   "max_parallel": 4,
///   "max_retries": 3,
///   "lock_timeout_ms": 30000,
///   "lock_stale_after_ms": 60000,
///   "stash_keep": 5
/// }
/// ```
///
/// Use `Config::try_from(raw)` to obtain a validated [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    /// Commit produced files after each successful checkpoint and at finish.
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,

    /// Shell commands run (in order) by the verification step of `finish`.
    #[serde(default)]
    pub verify_commands: Vec<String>,

    /// Per-command timeout for verification.
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,

    /// Number of completed tasks above which the rolling summary is grouped
    /// by category.
    #[serde(default = "default_summary_compress_threshold")]
    pub summary_compress_threshold: usize,

    /// Upper bound on the size of a batch handed out by `next-batch`.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Failed attempts after which a task becomes `failed`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long to wait for the state lock before giving up.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Age after which a lock held by a live process is considered abandoned.
    #[serde(default = "default_lock_stale_after_ms")]
    pub lock_stale_after_ms: u64,

    /// How many preserved-change stash entries to keep on resume.
    #[serde(default = "default_stash_keep")]
    pub stash_keep: usize,
}

fn default_auto_commit() -> bool {
    true
}

fn default_verify_timeout_ms() -> u64 {
    300_000
}

fn default_summary_compress_threshold() -> usize {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_lock_timeout_ms() -> u64 {
    30_000
}

fn default_lock_stale_after_ms() -> u64 {
    60_000
}

fn default_stash_keep() -> usize {
    5
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            auto_commit: default_auto_commit(),
            verify_commands: Vec::new(),
            verify_timeout_ms: default_verify_timeout_ms(),
            summary_compress_threshold: default_summary_compress_threshold(),
            max_parallel: None,
            max_retries: default_max_retries(),
            lock_timeout_ms: default_lock_timeout_ms(),
            lock_stale_after_ms: default_lock_stale_after_ms(),
            stash_keep: default_stash_keep(),
        }
    }
}

/// Validated configuration.
///
/// Constructed via `Config::try_from(RawConfig)` (see `validate.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    raw: RawConfig,
}

impl Config {
    pub(crate) fn new_unchecked(raw: RawConfig) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &RawConfig {
        &self.raw
    }

    pub fn auto_commit(&self) -> bool {
        self.raw.auto_commit
    }

    pub fn verify_commands(&self) -> &[String] {
        &self.raw.verify_commands
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.raw.verify_timeout_ms)
    }

    pub fn summary_compress_threshold(&self) -> usize {
        self.raw.summary_compress_threshold
    }

    pub fn max_parallel(&self) -> Option<usize> {
        self.raw.max_parallel
    }

    pub fn max_retries(&self) -> u32 {
        self.raw.max_retries
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.raw.lock_timeout_ms)
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_millis(self.raw.lock_stale_after_ms)
    }

    pub fn stash_keep(&self) -> usize {
        self.raw.stash_keep
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new_unchecked(RawConfig::default())
    }
}
