//! Execution order coordination across concurrently active changes.
//!
//! Once two or more OpenSpec changes are active at the same time, the shared
//! `EXECUTION_ORDER.md` must describe how they are sequenced, name every one
//! of them, and be refreshed whenever any of them is edited.

use crate::core::changes::ChangedFileSet;
use crate::core::error::PreflightError;
use crate::core::repo::{EXECUTION_ORDER_DOC, RepositoryContext};
use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use tracing::debug;

/// Section/field markers the coordination document must carry.
pub const REQUIRED_MARKERS: [&str; 4] = ["更新时间", "## 执行策略", "## 执行顺序", "## 依赖说明"];

static UPDATED_AT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^更新时间：(\d{4}-\d{2}-\d{2} \d{2}:\d{2})$").expect("static regex")
});

const IGNORED_CHANGE_DIRS: [&str; 2] = ["archive", "_template"];

/// Active change directories under `openspec/changes`, sorted by name.
pub fn list_active_changes(ctx: &RepositoryContext) -> Result<Vec<String>, PreflightError> {
    let changes_root = ctx.changes_dir();
    if !changes_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut active = Vec::new();
    for entry in fs::read_dir(&changes_root).map_err(PreflightError::IoError)? {
        let entry = entry.map_err(PreflightError::IoError)?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || IGNORED_CHANGE_DIRS.contains(&name.as_str()) {
            continue;
        }
        if entry.path().is_dir() {
            active.push(name);
        }
    }
    active.sort();
    Ok(active)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOrderOutcome {
    /// Fewer than two active changes; nothing to coordinate.
    Skipped { active: usize },
    Checked { active: Vec<String> },
}

/// Check the coordination document text against the active change set.
///
/// `content` is `None` when the document does not exist.
pub fn check_execution_order(
    active_changes: &[String],
    content: Option<&str>,
    changed: &ChangedFileSet,
) -> Result<ExecutionOrderOutcome, PreflightError> {
    if active_changes.len() < 2 {
        return Ok(ExecutionOrderOutcome::Skipped {
            active: active_changes.len(),
        });
    }

    let Some(content) = content else {
        return Err(PreflightError::MissingArtifact(format!(
            "[OPENSPEC_CHANGE] multiple active changes detected; missing {}",
            EXECUTION_ORDER_DOC
        )));
    };

    for marker in REQUIRED_MARKERS {
        if !content.contains(marker) {
            return Err(PreflightError::StructuralViolation(format!(
                "[OPENSPEC_CHANGE] {} missing required section/field: {}",
                EXECUTION_ORDER_DOC, marker
            )));
        }
    }

    match UPDATED_AT_PATTERN.captures(content) {
        Some(caps) => debug!(updated_at = &caps[1], "execution order timestamp"),
        None => {
            return Err(PreflightError::StructuralViolation(format!(
                "[OPENSPEC_CHANGE] {} 更新时间格式必须为 YYYY-MM-DD HH:mm",
                EXECUTION_ORDER_DOC
            )));
        }
    }

    if let Some(missing) = active_changes.iter().find(|name| !content.contains(name.as_str())) {
        return Err(PreflightError::StructuralViolation(format!(
            "[OPENSPEC_CHANGE] {} must include active change: {}",
            EXECUTION_ORDER_DOC, missing
        )));
    }

    if changed.touches_active_change(active_changes) && !changed.contains(EXECUTION_ORDER_DOC) {
        return Err(PreflightError::ConsistencyViolation(format!(
            "[OPENSPEC_CHANGE] active change content updated but {} not updated in this PR",
            EXECUTION_ORDER_DOC
        )));
    }

    Ok(ExecutionOrderOutcome::Checked {
        active: active_changes.to_vec(),
    })
}

/// Load the active changes and coordination document from disk, then check them.
pub fn validate_execution_order(
    ctx: &RepositoryContext,
    changed: &ChangedFileSet,
) -> Result<ExecutionOrderOutcome, PreflightError> {
    let active = list_active_changes(ctx)?;
    if active.len() < 2 {
        return check_execution_order(&active, None, changed);
    }

    let doc_path = ctx.execution_order_doc();
    let content = if doc_path.is_file() {
        Some(fs::read_to_string(&doc_path).map_err(PreflightError::IoError)?)
    } else {
        None
    };
    check_execution_order(&active, content.as_deref(), changed)
}
