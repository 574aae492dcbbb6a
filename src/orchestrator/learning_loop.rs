//! The attempt/verify/learn loop.
//!
//! Each attempt runs the agent, snapshots its changes, runs the tests and, on
//! failure, analyzes the diff, persists any rule and rolls the snapshot back.
//! Nothing that goes wrong inside an attempt escapes `run`; it either moves on
//! to the next attempt or ends the loop with one of the three outcomes.

use colored::Colorize;
use std::path::PathBuf;

use crate::analysis::{AnalysisBackend, FailureSignal};
use crate::executor::Executor;
use crate::fs::RuleStore;
use crate::git::SnapshotStore;
use crate::utils::{last_lines, preview, truncate};

/// Lines of failing test output echoed to the terminal.
const TEST_OUTPUT_TAIL_LINES: usize = 5;
const TEST_OUTPUT_LINE_WIDTH: usize = 80;
const PREVIEW_CHARS: usize = 100;

/// Mutable state owned by one `run` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    /// 1-based; 0 before the first attempt starts
    pub attempt_number: u32,
    pub max_retries: u32,
    pub auto_retry: bool,
    pub project_root: PathBuf,
}

impl LoopState {
    pub fn new(project_root: impl Into<PathBuf>, max_retries: u32, auto_retry: bool) -> Self {
        Self {
            attempt_number: 0,
            max_retries,
            auto_retry,
            project_root: project_root.into(),
        }
    }
}

/// Terminal outcome of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Tests passed on `attempt`
    Success { attempt: u32 },
    /// Auto-retry disabled; stopped after the first failed attempt
    StoppedForReview { attempt: u32 },
    /// Every attempt failed
    Exhausted { attempts: u32 },
}

impl LoopOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoopOutcome::Success { .. })
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    Passed,
    /// Tests failed; analysis and rollback ran
    Failed,
    /// Agent or tests could not complete; nothing to analyze
    Aborted,
}

pub struct LearningLoop {
    executor: Box<dyn Executor>,
    snapshots: Box<dyn SnapshotStore>,
    backend: Box<dyn AnalysisBackend>,
    rules: RuleStore,
    state: LoopState,
}

impl LearningLoop {
    pub fn new(
        executor: Box<dyn Executor>,
        snapshots: Box<dyn SnapshotStore>,
        backend: Box<dyn AnalysisBackend>,
        rules: RuleStore,
        state: LoopState,
    ) -> Self {
        Self {
            executor,
            snapshots,
            backend,
            rules,
            state,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run up to `max_retries` attempts at `task`.
    pub fn run(&mut self, task: &str) -> LoopOutcome {
        self.print_banner(task);
        tracing::info!(
            max_retries = self.state.max_retries,
            auto_retry = self.state.auto_retry,
            backend = self.backend.name(),
            "learning loop started"
        );

        for attempt in 1..=self.state.max_retries {
            self.state.attempt_number = attempt;

            println!("\n{}", "─".repeat(50).dimmed());
            println!(
                "{}",
                format!("ATTEMPT {attempt}/{}", self.state.max_retries).bold()
            );
            println!("{}", "─".repeat(50).dimmed());

            match self.run_attempt(task) {
                AttemptOutcome::Passed => {
                    tracing::info!(attempt, "tests passed");
                    println!("\n{}", "═".repeat(50).dimmed());
                    println!("{} {}", "✓".green().bold(), "SUCCESS: All tests passed!".green().bold());
                    println!("{}", "═".repeat(50).dimmed());
                    return LoopOutcome::Success { attempt };
                }
                AttemptOutcome::Aborted => continue,
                AttemptOutcome::Failed => {
                    if !self.state.auto_retry {
                        tracing::info!(attempt, "auto-retry disabled, stopping for review");
                        println!(
                            "\n{} Auto-retry disabled. Stopping for manual review.",
                            "⚠".yellow().bold()
                        );
                        return LoopOutcome::StoppedForReview { attempt };
                    }
                }
            }
        }

        tracing::info!(attempts = self.state.max_retries, "retries exhausted");
        println!("\n{}", "═".repeat(50).dimmed());
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("FAILED: Max retries ({}) exceeded", self.state.max_retries)
                .red()
                .bold()
        );
        println!("{}", "═".repeat(50).dimmed());
        LoopOutcome::Exhausted {
            attempts: self.state.max_retries,
        }
    }

    fn run_attempt(&mut self, task: &str) -> AttemptOutcome {
        let attempt = self.state.attempt_number;

        println!("\n{} Step 1: Executing task with the coding agent...", "→".cyan().bold());
        match self.executor.run_agent(task) {
            Ok(result) => {
                tracing::debug!(attempt, exit_code = result.exit_code, "agent finished");
                if result.passed() {
                    println!("  {} Task execution completed", "✓".green());
                } else {
                    println!(
                        "  {} Task execution completed (agent exit code: {})",
                        "⚠".yellow(),
                        result.exit_code
                    );
                }
            }
            Err(e) => {
                tracing::warn!(attempt, stage = "agent", error = %e, "attempt aborted");
                println!("  {} Task execution failed: {e}", "✗".red());
                return AttemptOutcome::Aborted;
            }
        }

        println!("\n{} Step 2: Committing changes...", "→".cyan().bold());
        let committed = match self.snapshots.commit(&format!("Learning Loop Attempt {attempt}")) {
            Ok(outcome) if outcome.committed => {
                println!("  {} Snapshot committed", "✓".green());
                true
            }
            Ok(_) => {
                tracing::info!(attempt, "agent made no changes");
                println!("  {} No changes were made by the agent", "⚠".yellow());
                false
            }
            Err(e) => {
                tracing::warn!(attempt, stage = "commit", error = %e, "snapshot commit failed");
                println!(
                    "  {} Snapshot commit failed, attempt changes discarded: {e:#}",
                    "⚠".yellow()
                );
                false
            }
        };

        println!("\n{} Step 3: Running tests...", "→".cyan().bold());
        let tests = match self.executor.run_tests() {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(attempt, stage = "tests", error = %e, "attempt aborted");
                println!("  {} Tests could not complete: {e}", "✗".red());
                if committed {
                    self.rollback();
                }
                return AttemptOutcome::Aborted;
            }
        };

        if tests.passed() {
            return AttemptOutcome::Passed;
        }

        println!("  {} Tests failed (exit code: {})", "✗".red(), tests.exit_code);
        let output = tests.combined_output();
        print_output_tail(&output);

        println!(
            "\n{} Step 4: Analyzing failure ({} mode)...",
            "→".cyan().bold(),
            self.backend.name()
        );
        let diff = if committed {
            self.snapshots.diff_since_previous()
        } else {
            String::new()
        };
        let signal = FailureSignal::from_test_failure(diff, output, task);
        let analysis = self.backend.analyze(&signal);
        tracing::info!(
            attempt,
            error_kind = %analysis.error_kind,
            has_rule = analysis.has_rule(),
            "analysis complete"
        );
        println!(
            "  {} Analysis received ({})",
            "✓".green(),
            analysis.error_kind.to_string().dimmed()
        );
        if !analysis.narrative.is_empty() {
            println!("  Root Cause: {}", preview(&analysis.narrative, PREVIEW_CHARS));
        }

        println!("\n{} Step 5: Learning from failure...", "→".cyan().bold());
        if analysis.has_rule() {
            println!("  New Rule: {}", preview(&analysis.rule, PREVIEW_CHARS));
            match self
                .rules
                .append_rule(&analysis.rule, analysis.error_kind.as_str())
            {
                Ok(_) => println!(
                    "  {} Rule appended to {}",
                    "✓".green(),
                    self.rules.path().display()
                ),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "failed to persist rule");
                    println!("  {} Failed to persist rule: {e:#}", "⚠".yellow());
                }
            }
        } else {
            println!("  {} No rule generated", "⚠".yellow());
        }

        println!("\n{} Step 6: Resetting for next attempt...", "→".cyan().bold());
        if committed {
            self.rollback();
        } else {
            println!("  {} Nothing to reset", "✓".green());
        }

        AttemptOutcome::Failed
    }

    fn rollback(&self) {
        match self.snapshots.rollback_last_commit() {
            Ok(()) => println!("  {} Reset complete", "✓".green()),
            Err(e) => {
                tracing::warn!(
                    attempt = self.state.attempt_number,
                    stage = "rollback",
                    error = %e,
                    "rollback failed"
                );
                println!("  {} Reset failed: {e:#}", "⚠".yellow());
            }
        }
    }

    fn print_banner(&self, task: &str) {
        println!();
        println!("{}", "═".repeat(60).dimmed());
        println!("{}", "PROMPT LEARNING LOOP".bold());
        println!("{}", "═".repeat(60).dimmed());
        println!("Task: {}", truncate(task, 80));
        println!("Project: {}", self.state.project_root.display());
        println!("Max Retries: {}", self.state.max_retries);
        println!("Auto-Retry: {}", self.state.auto_retry);
        println!("Analysis: {}", self.backend.name());
        println!("{}", "═".repeat(60).dimmed());
    }
}

fn print_output_tail(output: &str) {
    if output.trim().is_empty() {
        return;
    }
    println!("  Last {TEST_OUTPUT_TAIL_LINES} lines of output:");
    for line in last_lines(output, TEST_OUTPUT_TAIL_LINES) {
        println!("    {}", truncate(line, TEST_OUTPUT_LINE_WIDTH).dimmed());
    }
}
