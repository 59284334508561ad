//! Preflight: the gate a task branch must pass before its pull request proceeds.
//!
//! **Preflight only reads and judges.** It never writes to the repository,
//! keeps no state between runs, and stops at the first violation.
//!
//! # Contracts
//!
//! - **Branch**: the current branch is `task/<N>-<slug>`
//! - **Run log**: `openspec/_ops/task_runs/ISSUE-<N>.md` exists
//! - **Rulebook task**: `issue-<N>-<slug>` lives in exactly one of
//!   `rulebook/tasks/` (active) or `rulebook/tasks/archive/<date>-…` (archived);
//!   active tasks are re-validated by the `rulebook` tool
//! - **Change task lists**: every changed `openspec/changes/<name>/tasks.md`
//!   follows the TDD-first heading order and states the Red gate
//! - **Execution order**: with two or more active changes,
//!   `openspec/changes/EXECUTION_ORDER.md` is complete, timestamped, names every
//!   active change, and is updated together with them
//! - **Toolchain**: formatter over changed files, then typecheck, lint,
//!   contract check, and unit tests
//!
//! # Examples
//!
//! ```bash
//! # From anywhere inside the repository, on branch task/350-some-slug
//! preflight
//!
//! # Engine diagnostics
//! PREFLIGHT_LOG=debug preflight
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: validation engine, collaborators, and the run sequence

pub mod core;

use crate::core::{
    collaborator::ProcessRunner,
    config, error, output,
    preflight::{self, PreflightReport},
    repo::RepositoryContext,
    vcs::GitCli,
};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "PREFLIGHT_LOG";

#[derive(Parser, Debug)]
#[clap(
    name = "preflight",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pre-flight gate for task branches; behaviour is driven entirely by repository state"
)]
struct Cli {}

/// Install the stderr tracing subscriber; filter from `PREFLIGHT_LOG`, default `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by the binary.
pub fn run() -> Result<PreflightReport, error::PreflightError> {
    let _cli = Cli::parse();
    init_logging();

    let current_dir = std::env::current_dir()?;
    let mut git = GitCli::new(ProcessRunner);
    let ctx = RepositoryContext::new(git.discover_root(&current_dir)?);
    let config = config::load_config(ctx.root())?;
    tracing::debug!(root = %ctx.root().display(), base_ref = %config.base_ref, "starting preflight");

    let mut runner = ProcessRunner;
    let report = preflight::run_preflight(&ctx, &config, &mut git, &mut runner)?;
    output::success(&format!(
        "Pre-flight passed for {} ({} task, {} step(s))",
        report.task_id,
        report.location.kind,
        report.steps.len()
    ));
    Ok(report)
}
