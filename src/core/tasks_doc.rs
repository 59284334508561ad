//! TDD-first structure check for OpenSpec change task lists.
//!
//! A change's `tasks.md` must walk through specification, test mapping, and
//! red/green/refactor in that order, and must state the Red gate explicitly.

use crate::core::changes::ChangedFileSet;
use crate::core::error::PreflightError;
use crate::core::repo::RepositoryContext;
use std::fmt;
use std::fs;
use tracing::debug;

/// Ordered headings every change task list must contain.
pub const REQUIRED_CHANGE_TASKS_HEADINGS: [&str; 6] = [
    "## 1. Specification",
    "## 2. TDD Mapping（先测前提）",
    "## 3. Red（先写失败测试）",
    "## 4. Green（最小实现通过）",
    "## 5. Refactor（保持绿灯）",
    "## 6. Evidence",
];

pub const RED_GATE_PHRASE: &str = "未出现 Red（失败测试）不得进入实现";

/// A group of literals that must all appear, reported with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredLiteral {
    pub needles: &'static [&'static str],
    pub requirement: &'static str,
}

pub const REQUIRED_CHANGE_TASKS_LITERALS: [RequiredLiteral; 2] = [
    RequiredLiteral {
        needles: &[RED_GATE_PHRASE],
        requirement: "must contain Red-gate text: 未出现 Red（失败测试）不得进入实现",
    },
    RequiredLiteral {
        needles: &["Scenario", "映射"],
        requirement: "must include Scenario->测试映射要求 in TDD Mapping section",
    },
];

/// Headings and literals a document is checked against.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRules<'a> {
    pub headings: &'a [&'a str],
    pub literals: &'a [RequiredLiteral],
}

impl DocumentRules<'static> {
    pub fn change_tasks() -> Self {
        Self {
            headings: &REQUIRED_CHANGE_TASKS_HEADINGS,
            literals: &REQUIRED_CHANGE_TASKS_LITERALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentViolation {
    MissingHeading(String),
    HeadingOutOfOrder(String),
    MissingLiteral(String),
}

impl fmt::Display for DocumentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeading(h) => write!(f, "missing required heading: {}", h),
            Self::HeadingOutOfOrder(h) => write!(f, "headings out of order: {}", h),
            Self::MissingLiteral(req) => write!(f, "{}", req),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCheckResult {
    Pass,
    Fail(DocumentViolation),
}

impl DocumentCheckResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Check `content` against `rules`.
///
/// Headings match by first occurrence as plain substrings; each must start
/// strictly after the previous one. Literals are position independent and
/// only checked once all headings pass.
pub fn check_document_structure(content: &str, rules: &DocumentRules<'_>) -> DocumentCheckResult {
    let mut cursor: Option<usize> = None;
    for heading in rules.headings {
        let Some(idx) = content.find(heading) else {
            return DocumentCheckResult::Fail(DocumentViolation::MissingHeading(
                heading.to_string(),
            ));
        };
        if cursor.is_some_and(|prev| idx <= prev) {
            return DocumentCheckResult::Fail(DocumentViolation::HeadingOutOfOrder(
                heading.to_string(),
            ));
        }
        cursor = Some(idx);
    }

    for literal in rules.literals {
        if !literal.needles.iter().all(|n| content.contains(n)) {
            return DocumentCheckResult::Fail(DocumentViolation::MissingLiteral(
                literal.requirement.to_string(),
            ));
        }
    }

    DocumentCheckResult::Pass
}

/// Outcome of the change task-list gate over a changed-file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTasksOutcome {
    /// No changed task list matched the target pattern.
    Skipped,
    Checked(Vec<String>),
}

/// Validate every changed `openspec/changes/<name>/tasks.md` outside the archive.
pub fn validate_change_tasks(
    ctx: &RepositoryContext,
    changed: &ChangedFileSet,
) -> Result<ChangeTasksOutcome, PreflightError> {
    let targets = changed.change_task_documents();
    if targets.is_empty() {
        return Ok(ChangeTasksOutcome::Skipped);
    }

    let rules = DocumentRules::change_tasks();
    for rel_path in &targets {
        let abs_path = ctx.join(rel_path);
        if !abs_path.is_file() {
            return Err(PreflightError::MissingArtifact(format!(
                "[OPENSPEC_CHANGE] missing tasks file: {}",
                rel_path
            )));
        }
        let content = fs::read_to_string(&abs_path).map_err(PreflightError::IoError)?;
        debug!(path = %rel_path, bytes = content.len(), "checking change task list");

        if let DocumentCheckResult::Fail(violation) = check_document_structure(&content, &rules) {
            return Err(PreflightError::StructuralViolation(format!(
                "[OPENSPEC_CHANGE] {} {}",
                rel_path, violation
            )));
        }
    }

    Ok(ChangeTasksOutcome::Checked(targets))
}
