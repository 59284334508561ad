//! Rulebook task location.
//!
//! A task's governance record lives either in the active area
//! (`rulebook/tasks/<id>`) or, once finalized, in the archive area under a
//! date-prefixed name (`rulebook/tasks/archive/<date>-<id>`). Never both.

use crate::core::branch::TaskId;
use crate::core::error::PreflightError;
use crate::core::repo::RepositoryContext;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLocationKind {
    Active,
    Archive,
}

impl fmt::Display for TaskLocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

/// Where a task's directory was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub kind: TaskLocationKind,
    pub path: PathBuf,
}

impl TaskLocation {
    /// Archived tasks are finalized and skip registry validation.
    pub fn needs_registry_validation(&self) -> bool {
        self.kind == TaskLocationKind::Active
    }
}

/// Archive directories whose name is `<anything>-<task_id>`, sorted by name.
fn archived_matches(archive_dir: &Path, task_id: &TaskId) -> Result<Vec<PathBuf>, PreflightError> {
    if !archive_dir.is_dir() {
        return Ok(Vec::new());
    }

    let suffix = format!("-{}", task_id);
    let mut matches = Vec::new();
    for entry in fs::read_dir(archive_dir).map_err(PreflightError::IoError)? {
        let entry = entry.map_err(PreflightError::IoError)?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.len() > suffix.len() && name.ends_with(&suffix) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}

/// Resolve the single governance directory for `task_id`.
pub fn resolve_task_location(
    ctx: &RepositoryContext,
    task_id: &TaskId,
) -> Result<TaskLocation, PreflightError> {
    let active_dir = ctx.rulebook_tasks_dir().join(task_id.as_str());
    let active = active_dir.is_dir();
    let archived = archived_matches(&ctx.rulebook_archive_dir(), task_id)?;
    debug!(
        task_id = %task_id,
        active,
        archived = archived.len(),
        "resolving rulebook task location"
    );

    match (active, archived.as_slice()) {
        (false, []) => Err(PreflightError::MissingArtifact(format!(
            "[RULEBOOK] required task dir missing: {} (also not found in {})",
            active_dir.display(),
            ctx.rulebook_archive_dir().display()
        ))),
        (true, []) => Ok(TaskLocation {
            kind: TaskLocationKind::Active,
            path: active_dir,
        }),
        (false, [archive_dir]) => Ok(TaskLocation {
            kind: TaskLocationKind::Archive,
            path: archive_dir.clone(),
        }),
        (false, many) => Err(PreflightError::ConsistencyViolation(format!(
            "[RULEBOOK] task {} archived more than once: {}",
            task_id,
            many.iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
        (true, [archive_dir, ..]) => Err(PreflightError::ConsistencyViolation(format!(
            "[RULEBOOK] task is both active and archived: {} and {}",
            active_dir.display(),
            archive_dir.display()
        ))),
    }
}
