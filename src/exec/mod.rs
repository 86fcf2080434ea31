// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external programs (`git`, verification commands) with piped output,
//! optional stdin and an optional timeout. Children are spawned through a
//! `tokio::process::Command` driven by a current-thread runtime, so the rest
//! of the crate stays synchronous.
//!
//! - [`command`] holds the command description and the runner.

pub mod command;

pub use command::{run, run_blocking, CommandOutput, CommandSpec};
