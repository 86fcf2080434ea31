// src/store/mod.rs

//! Durable workflow state.
//!
//! - [`document`] renders and parses the progress document.
//! - [`history`] and [`heartbeat`] are the auxiliary logs.
//! - [`repository`] is the interface the service talks to.
//! - [`fs`] stores everything under a state directory; [`memory`] keeps it
//!   in process for tests.

pub mod document;
pub mod fs;
pub mod heartbeat;
pub mod history;
pub mod memory;
pub mod repository;

pub use fs::{write_atomic, FsRepository};
pub use heartbeat::Heartbeat;
pub use history::{HistoryEntry, HistoryEvent};
pub use memory::MemoryRepository;
pub use repository::WorkflowRepository;

/// Directory, relative to the project root, holding all persisted state.
pub const STATE_DIR_NAME: &str = ".taskweave";
