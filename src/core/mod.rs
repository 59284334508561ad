//! Preflight's validation engine and the collaborators it calls out to.
//!
//! The rule modules (`branch`, `rulebook`, `tasks_doc`, `execution_order`,
//! `changes`) are pure over a [`repo::RepositoryContext`] and text; process
//! execution lives behind `collaborator` and `vcs`.

pub mod branch;
pub mod changes;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod execution_order;
pub mod output;
pub mod preflight;
pub mod repo;
pub mod rulebook;
pub mod tasks_doc;
pub mod vcs;
