// src/logging.rs

//! Diagnostics for `taskweave`.
//!
//! Command results go to stdout, where the dispatching agent parses them;
//! everything emitted through `tracing` goes to stderr. The level comes from
//! `--log-level`, then `TASKWEAVE_LOG`, and is `warn` otherwise.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "TASKWEAVE_LOG";

const DEFAULT_LEVEL: Level = Level::WARN;

/// Install the stderr subscriber. Call once, before any command runs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Pick the effective level. An unparseable environment value falls back
/// to the default rather than failing the command.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    if let Some(lvl) = cli_level {
        return lvl.into();
    }
    env_value.and_then(parse_env_level).unwrap_or(DEFAULT_LEVEL)
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// `tracing`'s own names and numbers, plus `warning`.
fn parse_env_level(raw: &str) -> Option<Level> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    raw.parse().ok()
}
