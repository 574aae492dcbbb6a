//! `relearn run`: the test-driven learning loop.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{analysis_components, ConfigOverrides};
use crate::executor::ProcessExecutor;
use crate::git::{ensure_repository, GitSnapshots};
use crate::orchestrator::{LearningLoop, LoopState};

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub task: String,
    pub project_dir: PathBuf,
    pub max_retries: u32,
    pub auto_retry: bool,
    pub overrides: ConfigOverrides,
}

/// Run the learning loop. Returns whether the tests eventually passed.
pub fn execute(args: RunArgs) -> Result<bool> {
    let config = args.overrides.load()?;
    let project_root = ensure_repository(&args.project_dir)?;

    if let Some(mode) = args.overrides.teacher {
        println!("{} Analysis mode: {}", "→".dimmed(), mode.to_string().cyan());
    }

    let (backend, rules) = analysis_components(&config)?;
    let executor = ProcessExecutor::new(&project_root, config.agent.clone(), config.tests.clone());
    let snapshots = GitSnapshots::new(&project_root);

    let mut learning_loop = LearningLoop::new(
        Box::new(executor),
        Box::new(snapshots),
        backend,
        rules,
        LoopState::new(project_root, args.max_retries, args.auto_retry),
    );

    let outcome = learning_loop.run(&args.task);
    tracing::info!(?outcome, "learning loop finished");
    Ok(outcome.is_success())
}
