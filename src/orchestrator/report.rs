//! Manual failure reports: failures that never came from a test run.
//!
//! The report goes straight to the analysis backend and the rule store. The
//! rule is tagged with the reported kind, not the classifier's inferred one.

use anyhow::Result;
use colored::Colorize;

use crate::analysis::{AnalysisBackend, FailureFamily, FailureSignal};
use crate::fs::RuleStore;
use crate::utils::{preview, truncate};

/// Analyze a manually described failure and persist the resulting rule.
///
/// Returns whether a rule was generated and appended. Errors only when the
/// knowledge file cannot be written.
pub fn report_manual_failure(
    backend: &dyn AnalysisBackend,
    rules: &RuleStore,
    kind: FailureFamily,
    description: &str,
    context: &str,
    task: &str,
) -> Result<bool> {
    println!();
    println!("{}", "═".repeat(60).dimmed());
    println!("{}", "MANUAL FAILURE REPORT".bold());
    println!("{}", "═".repeat(60).dimmed());
    println!("Type: {kind}");
    println!("Task: {}", truncate(task, 80));
    println!("{}", "═".repeat(60).dimmed());

    println!(
        "\n{} Analyzing failure ({} mode)...",
        "→".cyan().bold(),
        backend.name()
    );
    let signal = FailureSignal::from_report(kind, description, context, task);
    let analysis = backend.analyze(&signal);
    tracing::info!(
        %kind,
        inferred = %analysis.error_kind,
        has_rule = analysis.has_rule(),
        "manual report analyzed"
    );

    if !analysis.narrative.is_empty() {
        println!("  {} Analysis: {}", "✓".green(), preview(&analysis.narrative, 100));
    }

    println!("\n{} Learning from failure...", "→".cyan().bold());
    if !analysis.has_rule() {
        println!("  {} No rule generated", "⚠".yellow());
        println!("\n{}", "═".repeat(60).dimmed());
        println!("{} {}", "✗".red().bold(), "No rule could be generated".red().bold());
        println!("{}", "═".repeat(60).dimmed());
        return Ok(false);
    }

    println!("  New Rule: {}", preview(&analysis.rule, 100));
    rules.append_rule(&analysis.rule, &format!("{kind} (manual report)"))?;
    println!("  {} Rule appended to {}", "✓".green(), rules.path().display());

    println!("\n{}", "═".repeat(60).dimmed());
    println!("{} {}", "✓".green().bold(), "SUCCESS: Rule appended".green().bold());
    println!("{}", "═".repeat(60).dimmed());
    Ok(true)
}
