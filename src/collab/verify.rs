// src/collab/verify.rs

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::exec::{run_blocking, CommandSpec};

/// Output characters quoted in a verification error.
const OUTPUT_EXCERPT_CHARS: usize = 500;

/// Test runners that exit non-zero when a project simply has no tests.
const NO_TESTS_MARKERS: [&str; 2] = ["No test files found", "no test files"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyResult {
    pub passed: bool,
    /// Commands that were configured for this run.
    pub scripts: Vec<String>,
    pub error: Option<String>,
}

impl VerifyResult {
    pub fn passed(scripts: Vec<String>) -> Self {
        Self {
            passed: true,
            scripts,
            error: None,
        }
    }

    pub fn failed(scripts: Vec<String>, error: impl Into<String>) -> Self {
        Self {
            passed: false,
            scripts,
            error: Some(error.into()),
        }
    }
}

/// Runs the project's checks.
pub trait Verifier: Send + Sync {
    fn verify(&self, cfg: &Config) -> VerifyResult;
}

/// Runs `verify_commands` one by one through the shell, stopping at the
/// first failure.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    root: PathBuf,
}

impl CommandVerifier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Verifier for CommandVerifier {
    fn verify(&self, cfg: &Config) -> VerifyResult {
        let scripts = cfg.verify_commands().to_vec();
        let timeout = cfg.verify_timeout();

        for command in &scripts {
            info!(cmd = %command, "running verification command");
            let spec = CommandSpec::shell(command).cwd(&self.root).timeout(timeout);
            let output = match run_blocking(&spec) {
                Ok(output) => output,
                Err(err) => {
                    return VerifyResult::failed(scripts.clone(), format!("{command} failed to start: {err:#}"));
                }
            };

            if output.timed_out {
                warn!(cmd = %command, "verification command timed out");
                return VerifyResult::failed(
                    scripts.clone(),
                    format!("{command} timed out after {}ms", timeout.as_millis()),
                );
            }
            if output.success {
                continue;
            }

            let text = if output.stderr.trim().is_empty() {
                output.stdout.clone()
            } else {
                output.stderr.clone()
            };
            if NO_TESTS_MARKERS.iter().any(|m| text.contains(m)) {
                info!(cmd = %command, "no tests found; treating as passed");
                continue;
            }

            let excerpt: String = text.chars().take(OUTPUT_EXCERPT_CHARS).collect();
            warn!(cmd = %command, exit_code = ?output.code, "verification command failed");
            return VerifyResult::failed(scripts.clone(), format!("{command} failed:\n{excerpt}"));
        }

        VerifyResult::passed(scripts)
    }
}
