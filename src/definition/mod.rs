// src/definition/mod.rs

//! Workflow definitions: what `init` and `add` turn into tasks.
//!
//! - [`model`] is the parsed, format-independent definition.
//! - [`markdown`] parses the numbered-list Markdown format.
//! - [`validate`] checks references and acyclicity before anything is
//!   persisted.

pub mod markdown;
pub mod model;
pub mod validate;

pub use markdown::MarkdownParser;
pub use model::{TaskSpec, WorkflowDefinition};
pub use validate::{validate_definition, DefinitionReport};

use crate::errors::Result;

/// Turns raw definition text into a [`WorkflowDefinition`].
pub trait DefinitionParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<WorkflowDefinition>;
}
