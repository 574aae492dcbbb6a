//! Learning loop against real git repositories

#![cfg(unix)]

use relearn::config::AgentConfig;
use relearn::executor::ProcessExecutor;
use relearn::fs::{RuleStore, RULES_SECTION_HEADER};
use relearn::orchestrator::{LearningLoop, LoopOutcome, LoopState};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

use super::helpers::*;

struct Run {
    outcome: LoopOutcome,
    counts: Rc<RefCell<SnapshotCounts>>,
    signals: Rc<RefCell<Vec<relearn::analysis::FailureSignal>>>,
    knowledge: String,
}

fn run_loop(repo: &Path, agent: AgentConfig, max_retries: u32, auto_retry: bool) -> Run {
    let knowledge_dir = TempDir::new().unwrap();
    let knowledge_path = knowledge_dir.path().join("CLAUDE.md");

    let (snapshots, counts) = CountingSnapshots::new(repo);
    let (direct, _) = direct_backend(DIVISION_NARRATIVE, DIVISION_RULE);
    let (backend, signals) = RecordingBackend::new(direct);

    let mut learning_loop = LearningLoop::new(
        Box::new(ProcessExecutor::new(repo, agent, calculator_tests())),
        Box::new(snapshots),
        Box::new(backend),
        RuleStore::new(&knowledge_path),
        LoopState::new(repo, max_retries, auto_retry),
    );
    let outcome = learning_loop.run("Fix the safe_divide function to handle division by zero");

    Run {
        outcome,
        counts,
        signals,
        knowledge: std::fs::read_to_string(&knowledge_path).unwrap_or_default(),
    }
}

#[test]
fn test_fails_once_then_succeeds() {
    let repo = calculator_repo();
    let agent = ScriptedAgent::fixes_on_second_try();

    let run = run_loop(repo.path(), agent.config(), 3, true);

    assert_eq!(run.outcome, LoopOutcome::Success { attempt: 2 });
    assert_eq!(agent.calls(), 2);

    // the failed attempt was rolled back, the passing one stays
    assert_eq!(
        log_subjects(repo.path()),
        vec!["Learning Loop Attempt 2", "Initial commit"]
    );
    let calculator = std::fs::read_to_string(repo.path().join("calculator.py")).unwrap();
    assert!(calculator.contains("return None"));

    let counts = run.counts.borrow();
    assert_eq!(counts.commits, 2);
    assert_eq!(counts.rollbacks, 1);

    // the analysis saw the buggy diff and the failing output
    let signals = run.signals.borrow();
    assert_eq!(signals.len(), 1);
    assert!(signals[0].diff_text.contains("+        return 0"));
    assert!(signals[0].error_text.contains("AssertionError: assert 0 is None"));

    assert_eq!(run.knowledge.matches(RULES_SECTION_HEADER).count(), 1);
    assert!(run.knowledge.contains("### Division by Zero Handling"));
    assert!(run.knowledge.contains(" from division_error\n"));
}

#[test]
fn test_exhausts_retries_and_restores_history() {
    let repo = calculator_repo();
    let initial_head = head(repo.path());
    let agent = ScriptedAgent::always_wrong();

    let run = run_loop(repo.path(), agent.config(), 3, true);

    assert_eq!(run.outcome, LoopOutcome::Exhausted { attempts: 3 });
    assert_eq!(agent.calls(), 3);

    let counts = run.counts.borrow();
    assert_eq!(counts.commits, 3);
    assert_eq!(counts.rollbacks, 3);

    assert_eq!(head(repo.path()), initial_head);
    assert!(is_clean(repo.path()));
    assert_eq!(
        std::fs::read_to_string(repo.path().join("calculator.py")).unwrap(),
        INITIAL_CALCULATOR
    );

    assert_eq!(run.knowledge.matches(RULES_SECTION_HEADER).count(), 1);
    assert_eq!(run.knowledge.matches("  - **Source**: Learned on ").count(), 3);
}

#[test]
fn test_stops_for_review_after_first_failure() {
    let repo = calculator_repo();
    let initial_head = head(repo.path());
    let agent = ScriptedAgent::always_wrong();

    let run = run_loop(repo.path(), agent.config(), 3, false);

    assert_eq!(run.outcome, LoopOutcome::StoppedForReview { attempt: 1 });
    assert_eq!(agent.calls(), 1);
    assert_eq!(run.counts.borrow().rollbacks, 1);
    assert_eq!(head(repo.path()), initial_head);
    assert!(run.knowledge.contains("### Division by Zero Handling"));
}

#[test]
fn test_noop_attempt_is_still_tested_and_analyzed() {
    let repo = calculator_repo();
    let initial_head = head(repo.path());
    let agent = ScriptedAgent::no_op();

    let run = run_loop(repo.path(), agent.config(), 1, true);

    assert_eq!(run.outcome, LoopOutcome::Exhausted { attempts: 1 });
    let counts = run.counts.borrow();
    assert_eq!(counts.commits, 0);
    assert_eq!(counts.empty_commits, 1);
    assert_eq!(counts.rollbacks, 0);

    // analyzed against an empty diff; nothing to undo
    let signals = run.signals.borrow();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].diff_text, "");
    assert_eq!(head(repo.path()), initial_head);
}

#[test]
fn test_agent_timeout_skips_to_next_attempt() {
    let repo = calculator_repo();
    let initial_head = head(repo.path());
    let agent = ScriptedAgent::new("sleep 10");
    let config = AgentConfig {
        timeout_secs: 1,
        ..agent.config()
    };

    let run = run_loop(repo.path(), config, 2, true);

    assert_eq!(run.outcome, LoopOutcome::Exhausted { attempts: 2 });
    assert_eq!(agent.calls(), 2);
    let counts = run.counts.borrow();
    assert_eq!(counts.commits + counts.empty_commits, 0);
    assert!(run.signals.borrow().is_empty());
    assert_eq!(head(repo.path()), initial_head);
}
