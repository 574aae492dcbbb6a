//! `relearn report-failure`: learn from a failure that did not come from tests.

use anyhow::Result;

use super::common::{analysis_components, ConfigOverrides};
use crate::analysis::FailureFamily;
use crate::orchestrator::report_manual_failure;

#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub kind: FailureFamily,
    pub description: String,
    pub context: String,
    pub task: String,
    pub overrides: ConfigOverrides,
}

/// Analyze the report and append a rule. Returns whether a rule was generated.
pub fn execute(args: ReportArgs) -> Result<bool> {
    let config = args.overrides.load()?;
    let (backend, rules) = analysis_components(&config)?;

    report_manual_failure(
        backend.as_ref(),
        &rules,
        args.kind,
        &args.description,
        &args.context,
        &args.task,
    )
}
