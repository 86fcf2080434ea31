// src/collab/mod.rs

//! External collaborators of the workflow service.
//!
//! - [`git`] records finished work as commits ([`Committer`]).
//! - [`verify`] runs the project's checks before finalization ([`Verifier`]).
//!
//! Both are traits so the service can be driven with fakes in tests.

pub mod git;
pub mod verify;

pub use git::{CommitRequest, Committer, GitCommitter, NoopCommitter, STASH_MARKER};
pub use verify::{CommandVerifier, VerifyResult, Verifier};
