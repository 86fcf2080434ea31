// src/config/loader.rs

use std::path::Path;

use crate::config::model::{Config, RawConfig};
use crate::errors::Result;
use crate::fs::FileSystem;

/// File name of the config inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Parse and validate a config document.
///
/// Unknown keys are ignored so that older binaries can read newer configs.
pub fn load_from_str(contents: &str) -> Result<Config> {
    let raw: RawConfig = serde_json::from_str(contents)?;
    Config::try_from(raw)
}

/// Load the config at `path`, falling back to defaults if the file is absent.
///
/// This is the entry point used by every service operation: the config is
/// re-read each time so edits take effect on the next command.
pub fn load_config(fs: &dyn FileSystem, path: &Path) -> Result<Config> {
    match fs.read_optional(path)? {
        Some(contents) if !contents.trim().is_empty() => load_from_str(&contents),
        _ => Ok(Config::default()),
    }
}
