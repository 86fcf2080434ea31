// src/collab/git.rs

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::exec::{run_blocking, CommandOutput, CommandSpec};
use crate::types::TaskId;

/// Message prefix identifying stash entries created by `cleanup`.
pub const STASH_MARKER: &str = "taskweave-resume:";

/// What to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Task id, or `"finish"` for the finalization commit.
    pub task_id: TaskId,
    pub title: String,
    pub summary: String,
    /// Files to stage; `None` stages everything.
    pub files: Option<Vec<String>>,
}

impl CommitRequest {
    pub fn message(&self) -> String {
        format!("task-{}: {}\n\n{}", self.task_id, self.title, self.summary)
    }
}

/// Records finished work in version control.
pub trait Committer: Send + Sync {
    /// Stage and commit; committing an unchanged tree is a no-op.
    fn commit(&self, request: &CommitRequest) -> Result<()>;

    /// Set aside uncommitted changes left by an interrupted attempt.
    fn cleanup(&self) -> Result<()>;

    /// Drop all but the newest `max_keep` entries created by `cleanup`.
    fn prune_old(&self, max_keep: usize) -> Result<()>;
}

/// Committer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommitter;

impl Committer for NoopCommitter {
    fn commit(&self, _request: &CommitRequest) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        Ok(())
    }

    fn prune_old(&self, _max_keep: usize) -> Result<()> {
        Ok(())
    }
}

/// Committer backed by the `git` executable, run in `root`.
///
/// Paths registered with [`GitCommitter::exclude`] are never staged,
/// stashed or counted as uncommitted changes.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    root: PathBuf,
    excluded: Vec<String>,
}

impl GitCommitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Keep `path` (relative to the root) out of every commit and stash.
    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        let path = path.into().trim_end_matches('/').to_string();
        if !path.is_empty() {
            self.excluded.push(path);
        }
        self
    }

    /// `-- . :(exclude)<path>...`, appended to tree-wide commands.
    fn tree_pathspec(&self) -> Vec<String> {
        let mut spec = vec!["--".to_string(), ".".to_string()];
        spec.extend(self.excluded.iter().map(|p| format!(":(exclude){p}")));
        spec
    }

    fn is_excluded(&self, file: &str) -> bool {
        let file = file.trim_start_matches("./");
        self.excluded.iter().any(|dir| {
            file == dir
                || file
                    .strip_prefix(dir.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn git_raw<I, S>(&self, args: I, stdin: Option<&str>) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = CommandSpec::new("git").args(args).cwd(&self.root);
        if let Some(input) = stdin {
            spec = spec.stdin(input);
        }
        run_blocking(&spec)
    }

    /// Run git and fail on a non-zero exit.
    fn git<I, S>(&self, args: I, stdin: Option<&str>) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let output = self.git_raw(args.clone(), stdin)?;
        if !output.success {
            bail!("git {} failed: {}", args.join(" "), output.combined());
        }
        Ok(output)
    }
}

impl Committer for GitCommitter {
    fn commit(&self, request: &CommitRequest) -> Result<()> {
        match &request.files {
            Some(files) if !files.is_empty() => {
                for file in files {
                    if self.is_excluded(file) {
                        warn!(file = %file, "not staging file inside an excluded path");
                        continue;
                    }
                    self.git(["add", "--", file.as_str()], None)?;
                }
            }
            _ => {
                let mut args = vec!["add".to_string(), "-A".to_string()];
                args.extend(self.tree_pathspec());
                self.git(args, None)?;
            }
        }

        // Exit status 1 means the index differs from HEAD.
        let diff = self.git_raw(["diff", "--cached", "--quiet"], None)?;
        match diff.code {
            Some(0) => {
                debug!(task = %request.task_id, "nothing staged; skipping commit");
                return Ok(());
            }
            Some(1) => {}
            _ => bail!("git diff --cached failed: {}", diff.combined()),
        }

        self.git(["commit", "-F", "-"], Some(&request.message()))?;
        info!(task = %request.task_id, "committed task changes");
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        let mut status_args = vec!["status".to_string(), "--porcelain".to_string()];
        status_args.extend(self.tree_pathspec());
        let status = self.git(status_args, None)?;
        if status.stdout.trim().is_empty() {
            return Ok(());
        }
        let message = format!("{STASH_MARKER} auto-stashed on interrupt recovery");
        let mut stash_args = vec![
            "stash".to_string(),
            "push".to_string(),
            "-m".to_string(),
            message,
        ];
        stash_args.extend(self.tree_pathspec());
        self.git(stash_args, None)?;
        info!("stashed uncommitted changes from interrupted tasks");
        Ok(())
    }

    fn prune_old(&self, max_keep: usize) -> Result<()> {
        let list = self.git(["stash", "list"], None)?;
        let marked: Vec<usize> = list
            .stdout
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(STASH_MARKER))
            .map(|(i, _)| i)
            .collect();

        // Drop from the highest index down so earlier indices stay valid.
        for index in marked.into_iter().skip(max_keep).rev() {
            let entry = format!("stash@{{{index}}}");
            if let Err(err) = self.git(["stash", "drop", entry.as_str()], None) {
                warn!(entry = %entry, error = %err, "failed to drop old stash entry");
            }
        }
        Ok(())
    }
}
