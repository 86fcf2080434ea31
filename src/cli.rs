// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{TaskCategory, TaskId};

/// Command-line arguments for `taskweave`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskweave",
    version,
    about = "Hand out dependency-ordered tasks to workers and track their outcomes.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root holding the `.taskweave` state directory.
    ///
    /// Default: the current working directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKWEAVE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a workflow from a Markdown task list (file or stdin).
    Init {
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Replace a workflow that is still open.
        #[arg(long)]
        force: bool,
    },
    /// Check out the next eligible task.
    Next,
    /// Check out every eligible task.
    NextBatch,
    /// Report the outcome of an active task.
    ///
    /// The detail is read from stdin when `--detail` is absent. A detail
    /// starting with `FAILED` reports a failure.
    Checkpoint {
        id: TaskId,
        #[arg(long)]
        detail: Option<String>,
        /// Report a failure; the detail is the reason.
        #[arg(long)]
        failed: bool,
        /// Files produced by the task, committed on success.
        #[arg(long, num_args = 1.., value_name = "FILE")]
        files: Vec<String>,
    },
    /// Mark a task skipped.
    Skip { id: TaskId },
    /// Change a pending task.
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        category: Option<TaskCategory>,
        /// Comma-separated dependency ids; replaces the current list.
        #[arg(long, value_delimiter = ',')]
        deps: Option<Vec<TaskId>>,
    },
    /// Show one task with its output.
    Show { id: TaskId },
    /// Show recent history.
    Log {
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },
    /// Pause the workflow; active tasks go back to pending.
    Pause,
    /// Record that the finished work was reviewed.
    Review,
    /// Verify and finalize the workflow.
    Finish,
    /// Show progress.
    Status {
        /// List active tasks checked out longer than this many seconds.
        #[arg(long, value_name = "SECS")]
        stale_after: Option<u64>,
    },
    /// Recover after an interruption.
    Resume,
    /// Append a task.
    Add {
        title: String,
        #[arg(long, value_enum, default_value_t = TaskCategory::General)]
        category: TaskCategory,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated dependency ids.
        #[arg(long, value_delimiter = ',')]
        deps: Vec<TaskId>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
