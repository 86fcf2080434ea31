// src/config/validate.rs

use crate::config::model::{Config, RawConfig};
use crate::errors::{Result, TaskweaveError};

impl TryFrom<RawConfig> for Config {
    type Error = crate::errors::TaskweaveError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_limits(cfg)?;
    validate_verify_commands(cfg)?;
    Ok(())
}

fn validate_limits(cfg: &RawConfig) -> Result<()> {
    if cfg.max_retries == 0 {
        return Err(TaskweaveError::ConfigError(
            "max_retries must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.max_parallel == Some(0) {
        return Err(TaskweaveError::ConfigError(
            "max_parallel must be >= 1 when set (got 0)".to_string(),
        ));
    }

    if cfg.lock_timeout_ms == 0 {
        return Err(TaskweaveError::ConfigError(
            "lock_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.verify_timeout_ms == 0 {
        return Err(TaskweaveError::ConfigError(
            "verify_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_verify_commands(cfg: &RawConfig) -> Result<()> {
    if let Some(idx) = cfg.verify_commands.iter().position(|c| c.trim().is_empty()) {
        return Err(TaskweaveError::ConfigError(format!(
            "verify_commands[{idx}] is empty"
        )));
    }
    Ok(())
}
