//! Manual failure reports through the real direct backend

use relearn::analysis::{prompts, FailureFamily};
use relearn::fs::RuleStore;
use relearn::orchestrator::report_manual_failure;
use tempfile::TempDir;

use super::helpers::*;

const INVENTORY_RULE: &str = "### Infrastructure Inventory\n\
- **Rule**: List existing workflows before creating a new one\n\
- **When**: Deploying or importing workflows\n\
- **Why**: Extending existing infrastructure avoids duplicates";

#[test]
fn test_report_tags_rule_with_reported_kind() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(dir.path().join("CLAUDE.md"));
    let (backend, systems) = direct_backend(
        "A redundant workflow was created instead of extending the existing one.",
        INVENTORY_RULE,
    );

    let generated = report_manual_failure(
        &backend,
        &store,
        "integration_error".parse::<FailureFamily>().unwrap(),
        "created duplicate workflow",
        "should have checked existing infra",
        "deploy workflow",
    )
    .unwrap();

    assert!(generated);
    let content = std::fs::read_to_string(store.path()).unwrap();
    assert!(content.contains("### Infrastructure Inventory"));
    assert!(content.contains(" from integration_error (manual report)\n"));

    let systems = systems.borrow();
    assert_eq!(systems[0], prompts::INTEGRATION_SYSTEM);
    assert_eq!(systems[1], prompts::RULE_GENERATOR_SYSTEM);
}

#[test]
fn test_report_without_rule_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(dir.path().join("CLAUDE.md"));
    let (backend, _) = direct_backend("nothing actionable", "   ");

    let generated = report_manual_failure(
        &backend,
        &store,
        FailureFamily::ScopeError,
        "over-built the feature",
        "a flag would have done",
        "add export option",
    )
    .unwrap();

    assert!(!generated);
    assert!(!store.path().exists());
}
