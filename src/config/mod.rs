// src/config/mod.rs

//! Configuration loading and validation for taskweave.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load a config file through the filesystem abstraction (`loader.rs`).
//! - Validate basic invariants like non-zero limits (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_config, load_from_str, CONFIG_FILE_NAME};
pub use model::{Config, RawConfig};
