use preflight::core::changes::ChangedFileSet;
use preflight::core::collaborator::{CommandOutput, CommandRunner};
use preflight::core::config::{CheckDef, PreflightConfig};
use preflight::core::error::PreflightError;
use preflight::core::preflight::{StepStatus, run_preflight};
use preflight::core::repo::RepositoryContext;
use preflight::core::rulebook::TaskLocationKind;
use preflight::core::tasks_doc::{RED_GATE_PHRASE, REQUIRED_CHANGE_TASKS_HEADINGS};
use preflight::core::vcs::VersionControl;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const BRANCH: &str = "task/350-self-archive-nonrecursive-governance";
const TASK_ID: &str = "issue-350-self-archive-nonrecursive-governance";

struct FakeVcs {
    branch: String,
    changed: Vec<String>,
}

impl FakeVcs {
    fn on(branch: &str, changed: &[&str]) -> Self {
        Self {
            branch: branch.to_string(),
            changed: changed.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl VersionControl for FakeVcs {
    fn current_branch(&mut self, _ctx: &RepositoryContext) -> Result<String, PreflightError> {
        Ok(self.branch.clone())
    }

    fn changed_files(
        &mut self,
        _ctx: &RepositoryContext,
        _base_ref: &str,
    ) -> Result<ChangedFileSet, PreflightError> {
        Ok(ChangedFileSet::from_paths(&self.changed))
    }
}

/// Records every command; fails the ones whose joined argv starts with `fail_prefix`.
#[derive(Default)]
struct RecordingRunner {
    calls: Vec<String>,
    fail_prefix: Option<String>,
}

impl RecordingRunner {
    fn failing(prefix: &str) -> Self {
        Self {
            calls: Vec::new(),
            fail_prefix: Some(prefix.to_string()),
        }
    }

    fn ran(&self, prefix: &str) -> bool {
        self.calls.iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, argv: &[String], _cwd: &Path) -> Result<CommandOutput, PreflightError> {
        let joined = argv.join(" ");
        self.calls.push(joined.clone());
        let failed = self
            .fail_prefix
            .as_deref()
            .is_some_and(|p| joined.starts_with(p));
        Ok(CommandOutput {
            code: if failed { 1 } else { 0 },
            out: if failed { "boom".to_string() } else { String::new() },
        })
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write file");
}

fn write_task_dir(root: &Path, rel_dir: &str) {
    for name in [".metadata.json", "proposal.md", "tasks.md"] {
        write(root, &format!("{}/{}", rel_dir, name), "ok");
    }
}

fn setup_repo() -> (TempDir, RepositoryContext) {
    let tmp = tempdir().expect("tempdir");
    let ctx = RepositoryContext::new(tmp.path());
    write(tmp.path(), "openspec/_ops/task_runs/ISSUE-350.md", "# run log\n");
    fs::create_dir_all(ctx.rulebook_archive_dir()).expect("archive dir");
    (tmp, ctx)
}

fn valid_tasks_doc() -> String {
    let h = REQUIRED_CHANGE_TASKS_HEADINGS;
    format!(
        "{}\n\n{}\n\n- 每个 Scenario 映射到测试\n- {}\n\n{}\n\n{}\n\n{}\n\n{}\n",
        h[0], h[1], RED_GATE_PHRASE, h[2], h[3], h[4], h[5]
    )
}

#[test]
fn active_task_runs_registry_and_remaining_checks() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));

    let mut vcs = FakeVcs::on(BRANCH, &["src/app.ts", "scripts/tool.py"]);
    let mut runner = RecordingRunner::default();
    let report = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect("preflight should pass");

    assert_eq!(report.location.kind, TaskLocationKind::Active);
    assert_eq!(report.task_id.as_str(), TASK_ID);
    assert_eq!(report.changed_files, 2);
    assert_eq!(
        runner.calls,
        vec![
            "git status --porcelain=v1".to_string(),
            format!("rulebook task validate {}", TASK_ID),
            "pnpm exec prettier --check src/app.ts".to_string(),
            "pnpm typecheck".to_string(),
            "pnpm lint".to_string(),
            "pnpm contract:check".to_string(),
            "pnpm test:unit".to_string(),
        ]
    );
    assert_eq!(
        report.step("execution order check").map(|s| s.status),
        Some(StepStatus::Skipped)
    );
}

#[test]
fn archived_task_skips_registry_validation() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(
        tmp.path(),
        &format!("rulebook/tasks/archive/2026-02-09-{}", TASK_ID),
    );

    let mut vcs = FakeVcs::on(BRANCH, &[]);
    let mut runner = RecordingRunner::default();
    let report = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect("preflight should pass");

    assert_eq!(report.location.kind, TaskLocationKind::Archive);
    assert!(!runner.ran("rulebook"));
    assert!(!runner.ran("pnpm exec prettier"));
    assert!(runner.ran("pnpm test:unit"));
    assert_eq!(
        report.step("rulebook-validate").map(|s| s.status),
        Some(StepStatus::Skipped)
    );
}

#[test]
fn task_in_both_areas_aborts_before_collaborators() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));
    write_task_dir(
        tmp.path(),
        &format!("rulebook/tasks/archive/2026-02-09-{}", TASK_ID),
    );

    let mut vcs = FakeVcs::on(BRANCH, &["src/app.ts"]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("both locations must fail");

    assert!(matches!(err, PreflightError::ConsistencyViolation(_)));
    assert!(err.to_string().contains("both active and archived"));
    assert_eq!(runner.calls, vec!["git status --porcelain=v1".to_string()]);
}

#[test]
fn malformed_branch_is_a_contract_violation() {
    let (_tmp, ctx) = setup_repo();
    let mut vcs = FakeVcs::on("feature/Task_350", &[]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("branch must fail");

    assert!(matches!(err, PreflightError::ContractViolation(_)));
    assert!(err.to_string().contains("feature/Task_350"));
    assert!(runner.calls.is_empty());
}

#[test]
fn missing_run_log_fails_before_repo_checks() {
    let tmp = tempdir().expect("tempdir");
    let ctx = RepositoryContext::new(tmp.path());
    let mut vcs = FakeVcs::on(BRANCH, &[]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("run log must be required");

    assert!(matches!(err, PreflightError::MissingArtifact(_)));
    assert!(err.to_string().contains("[RUN_LOG] required file missing"));
    assert!(err.to_string().contains("ISSUE-350.md"));
    assert!(runner.calls.is_empty());
}

#[test]
fn missing_task_dir_fails() {
    let (_tmp, ctx) = setup_repo();
    let mut vcs = FakeVcs::on(BRANCH, &[]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("task dir must be required");
    assert!(err.to_string().contains("required task dir missing"));
}

#[test]
fn invalid_change_tasks_stop_before_formatter() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));
    write(
        tmp.path(),
        "openspec/changes/add-x/tasks.md",
        &valid_tasks_doc().replace(RED_GATE_PHRASE, "TBD"),
    );

    let mut vcs = FakeVcs::on(BRANCH, &["openspec/changes/add-x/tasks.md"]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("red gate must be required");

    assert!(matches!(err, PreflightError::StructuralViolation(_)));
    assert!(err.to_string().contains("Red-gate"));
    assert!(!runner.ran("pnpm"));
}

#[test]
fn execution_order_must_be_refreshed_with_active_changes() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));
    write(tmp.path(), "openspec/changes/add-x/tasks.md", &valid_tasks_doc());
    write(tmp.path(), "openspec/changes/add-y/tasks.md", &valid_tasks_doc());
    write(
        tmp.path(),
        "openspec/changes/EXECUTION_ORDER.md",
        "更新时间：2026-02-09 10:00\n\n## 执行策略\n\n## 执行顺序\n\n1. add-x\n2. add-y\n\n## 依赖说明\n",
    );

    let mut vcs = FakeVcs::on(BRANCH, &["openspec/changes/add-x/tasks.md"]);
    let mut runner = RecordingRunner::default();
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("order doc must be in the submission");
    assert!(matches!(err, PreflightError::ConsistencyViolation(_)));

    let mut vcs = FakeVcs::on(
        BRANCH,
        &[
            "openspec/changes/add-x/tasks.md",
            "openspec/changes/EXECUTION_ORDER.md",
        ],
    );
    let mut runner = RecordingRunner::default();
    let report = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect("preflight should pass");
    assert_eq!(
        report.step("execution order check").map(|s| s.status),
        Some(StepStatus::Passed)
    );
    assert!(runner.ran(
        "pnpm exec prettier --check openspec/changes/EXECUTION_ORDER.md openspec/changes/add-x/tasks.md"
    ));
}

#[test]
fn collaborator_failure_stops_later_checks() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));

    let mut vcs = FakeVcs::on(BRANCH, &[]);
    let mut runner = RecordingRunner::failing("pnpm lint");
    let err = run_preflight(&ctx, &PreflightConfig::default(), &mut vcs, &mut runner)
        .expect_err("lint failure must be fatal");

    assert!(matches!(err, PreflightError::CollaboratorFailure(_)));
    assert_eq!(err.to_string(), "command failed: pnpm lint (exit 1)");
    assert!(!runner.ran("pnpm contract:check"));
    assert!(!runner.ran("pnpm test:unit"));
}

#[test]
fn configured_checks_replace_defaults() {
    let (tmp, ctx) = setup_repo();
    write_task_dir(tmp.path(), &format!("rulebook/tasks/{}", TASK_ID));

    let config = PreflightConfig {
        checks: vec![CheckDef {
            name: "unit".to_string(),
            command: "npm".to_string(),
            args: vec!["test".to_string()],
        }],
        ..PreflightConfig::default()
    };
    let mut vcs = FakeVcs::on(BRANCH, &[]);
    let mut runner = RecordingRunner::default();
    run_preflight(&ctx, &config, &mut vcs, &mut runner).expect("preflight should pass");

    assert_eq!(runner.calls.last().map(String::as_str), Some("npm test"));
    assert!(!runner.ran("pnpm"));
}
