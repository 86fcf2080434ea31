// src/lib.rs

pub mod cli;
pub mod collab;
pub mod config;
pub mod dag;
pub mod definition;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod summary;
pub mod types;

use std::io::{IsTerminal, Read};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::service::{CheckpointInput, NewTask, TaskUpdate, WorkflowService};

/// Prefix of a checkpoint detail that reports a failure.
const FAILED_PREFIX: &str = "FAILED";

/// High-level entry point used by `main.rs`.
///
/// Resolves the project root, builds the service over `<root>/.taskweave`
/// and maps the subcommand onto one service operation, printing its report.
pub fn run(args: CliArgs) -> Result<()> {
    let root = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    debug!(root = ?root, "using project root");
    let service = WorkflowService::for_project(&root);

    match args.command {
        Command::Init { file, force } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading definition {:?}", path))?,
                None => read_piped_stdin()?
                    .context("no definition given; pass --file or pipe it on stdin")?,
            };
            println!("{}", service.init(&raw, force)?);
        }
        Command::Next => println!("{}", service.next()?),
        Command::NextBatch => println!("{}", service.next_batch()?),
        Command::Checkpoint {
            id,
            detail,
            failed,
            files,
        } => {
            let detail = match detail {
                Some(detail) => detail,
                None => read_piped_stdin()?.unwrap_or_default(),
            };
            let input = checkpoint_input(detail, failed, files);
            println!("{}", service.checkpoint(&id, input)?);
        }
        Command::Skip { id } => println!("{}", service.skip(&id)?),
        Command::Edit {
            id,
            title,
            description,
            category,
            deps,
        } => {
            let update = TaskUpdate {
                title,
                description,
                category,
                deps,
            };
            println!("{}", service.edit(&id, update)?);
        }
        Command::Show { id } => println!("{}", service.show(&id)?),
        Command::Log { limit } => println!("{}", service.log(Some(limit))?),
        Command::Pause => println!("{}", service.pause()?),
        Command::Review => println!("{}", service.review()?),
        Command::Finish => println!("{}", service.finish()?),
        Command::Status { stale_after } => {
            match service.status(stale_after.map(Duration::from_secs))? {
                Some(report) => println!("{report}"),
                None => println!("No workflow. Run `taskweave init` to start one."),
            }
        }
        Command::Resume => println!("{}", service.resume()?),
        Command::Add {
            title,
            category,
            description,
            deps,
        } => {
            if title.trim().is_empty() {
                bail!("task title is empty");
            }
            let new_task = NewTask {
                title,
                category,
                description,
                deps,
            };
            println!("{}", service.add(new_task)?);
        }
    }

    Ok(())
}

/// Interpret a checkpoint detail.
///
/// `--failed`, or a detail starting with `FAILED`, reports a failure whose
/// reason is the rest of the text.
pub fn checkpoint_input(detail: String, failed: bool, files: Vec<String>) -> CheckpointInput {
    if failed {
        return CheckpointInput::Failure {
            reason: detail.trim().to_string(),
        };
    }
    if let Some(rest) = detail.trim_start().strip_prefix(FAILED_PREFIX) {
        let reason = rest.trim_start_matches([':', ' ', '\t']).trim();
        return CheckpointInput::Failure {
            reason: reason.to_string(),
        };
    }
    CheckpointInput::Success {
        detail,
        files: if files.is_empty() { None } else { Some(files) },
    }
}

/// Stdin contents when it is piped; `None` for an interactive terminal.
fn read_piped_stdin() -> Result<Option<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(Some(buf))
}
