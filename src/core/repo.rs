//! Repository layout consumed by the gate.
//!
//! Every check receives a [`RepositoryContext`] instead of reading the process
//! working directory, so the whole engine can run against a temporary tree.

use std::path::{Path, PathBuf};

pub const RULEBOOK_TASKS_DIR: &str = "rulebook/tasks";
pub const RULEBOOK_ARCHIVE_DIR: &str = "rulebook/tasks/archive";
pub const CHANGES_DIR: &str = "openspec/changes";
pub const CHANGES_ARCHIVE_PREFIX: &str = "openspec/changes/archive/";
pub const EXECUTION_ORDER_DOC: &str = "openspec/changes/EXECUTION_ORDER.md";
pub const TASK_RUNS_DIR: &str = "openspec/_ops/task_runs";

/// Explicit repository root threaded through every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub root: PathBuf,
}

impl RepositoryContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a repository-relative path.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn rulebook_tasks_dir(&self) -> PathBuf {
        self.root.join(RULEBOOK_TASKS_DIR)
    }

    pub fn rulebook_archive_dir(&self) -> PathBuf {
        self.root.join(RULEBOOK_ARCHIVE_DIR)
    }

    pub fn changes_dir(&self) -> PathBuf {
        self.root.join(CHANGES_DIR)
    }

    pub fn execution_order_doc(&self) -> PathBuf {
        self.root.join(EXECUTION_ORDER_DOC)
    }

    /// Run log for an issue: `openspec/_ops/task_runs/ISSUE-<N>.md`.
    pub fn run_log(&self, task_number: &str) -> PathBuf {
        self.root
            .join(TASK_RUNS_DIR)
            .join(format!("ISSUE-{}.md", task_number))
    }
}
