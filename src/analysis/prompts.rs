//! System prompts and user-message templates for the reasoning backend.

use super::{FailureFamily, FailureSignal};
use crate::utils::cap;

/// Diff characters included in the root-cause message.
const PROMPT_DIFF_CHARS: usize = 8_000;
/// Error characters included in the root-cause message.
const PROMPT_ERROR_CHARS: usize = 4_000;

pub const ROOT_CAUSE_SYSTEM: &str = "You are a senior software engineer analyzing test failures.

Given:
- Task Description: What the developer was trying to accomplish
- Code Diff: The changes made to the codebase
- Error Logs: The test failure output

Analyze and explain:
1. What specific error occurred
2. WHY the code failed (root cause)
3. The pattern of mistake (e.g., \"forgot null check\", \"wrong API usage\", \"missing import\")

Be concise and technical. Focus on the actionable root cause.";

pub const RULE_GENERATOR_SYSTEM: &str = "Based on the root cause analysis provided, write a SINGLE preventive rule
for the developer's CLAUDE.md file. This rule should:

1. Be actionable and specific
2. Prevent this exact type of error in the future
3. Follow this EXACT format (including the markdown formatting):

### [Short Category Name]
- **Rule**: [Clear instruction in imperative form]
- **When**: [Context when this rule applies]
- **Why**: [Brief explanation]

Example output:
### Array Safety
- **Rule**: Always check if array is empty before accessing index 0
- **When**: Working with arrays from API responses or user input
- **Why**: Prevents IndexError on empty results

IMPORTANT: Output ONLY the rule in the format above. No additional text or explanation.";

pub const PLANNING_SYSTEM: &str = "You are a senior engineer analyzing planning failures.

The agent made a mistake in HOW it approached a task, not in the code itself.
Common causes:
- Assumed a blank slate instead of checking existing infrastructure
- Misunderstood requirements or scope
- Chose the wrong integration approach
- Over-scoped or under-scoped the solution
- Did not verify preconditions before acting

Given:
- Task Description: What was being attempted
- Context: What should have happened
- Failure Description: What went wrong

Analyze:
1. WHY the approach was wrong
2. What check or verification was missed
3. The pattern of planning mistake

Be concise and focus on the PROCESS failure, not code.";

pub const INTEGRATION_SYSTEM: &str = "You are a systems architect analyzing integration failures.

The agent created something new when it should have extended existing infrastructure.
Common causes:
- Did not check for existing systems before creating new ones
- Assumed a blank slate instead of taking inventory
- Missed related components that should have been extended
- Created duplicate functionality

Given:
- Task Description: What was being attempted
- Context: What existing infrastructure was missed
- Failure Description: What redundant thing was created

Analyze:
1. What check would have found the existing system
2. Why the \"create new\" approach was wrong
3. The verification pattern that was skipped

Focus on the DISCOVERY failure, not implementation.";

pub const WORKFLOW_SYSTEM: &str = "You are a workflow automation architect analyzing workflow design failures.

The workflow had structural or design issues:
- Wrong node types chosen
- Missing error handling paths
- Incorrect node connections or routing
- Integration with existing workflows missed
- Credential or configuration issues

Given:
- Task Description: The workflow being built
- Context: What should have happened
- Failure Description: The design issue

Analyze:
1. What workflow design practice was violated
2. What verification step was skipped
3. The design pattern that should have been used

Focus on workflow-specific design principles.";

pub const ARCHITECTURE_SYSTEM: &str = "You are a software architect analyzing architectural failures.

The agent chose the wrong design pattern or structure:
- Wrong abstraction level
- Incorrect separation of concerns
- Missing or wrong design patterns
- Scalability or maintainability issues

Given:
- Task Description: What was being designed
- Context: What pattern should have been used
- Failure Description: What went wrong

Analyze:
1. What architectural principle was violated
2. What design pattern should have been applied
3. The decision process that led to the wrong choice

Focus on architectural principles and patterns.";

/// Root-cause system prompt for a failure family.
pub fn system_prompt(family: FailureFamily) -> &'static str {
    match family {
        FailureFamily::TestFailure | FailureFamily::Other => ROOT_CAUSE_SYSTEM,
        FailureFamily::PlanningError | FailureFamily::ScopeError => PLANNING_SYSTEM,
        FailureFamily::IntegrationError | FailureFamily::ConfigError => INTEGRATION_SYSTEM,
        FailureFamily::WorkflowError => WORKFLOW_SYSTEM,
        FailureFamily::ArchitectureError => ARCHITECTURE_SYSTEM,
    }
}

fn or_placeholder<'a>(text: &'a str, limit: usize, placeholder: &'a str) -> &'a str {
    if text.is_empty() {
        placeholder
    } else {
        cap(text, limit)
    }
}

/// User message for the root-cause call.
///
/// Test failures are framed as a fenced diff and error log. Process failures
/// already carry their own `## Context` / `## Failure Description` headings.
pub fn root_cause_message(signal: &FailureSignal) -> String {
    let task = &signal.task_description;

    if signal.family.is_process_failure() {
        let context = or_placeholder(&signal.diff_text, PROMPT_DIFF_CHARS, "No context available");
        let description = or_placeholder(
            &signal.error_text,
            PROMPT_ERROR_CHARS,
            "No failure description available",
        );
        format!(
            "## Task Description\n{task}\n\n{context}\n\n{description}\n\nAnalyze the root cause of this failure."
        )
    } else {
        let diff = or_placeholder(&signal.diff_text, PROMPT_DIFF_CHARS, "No diff available");
        let errors = or_placeholder(&signal.error_text, PROMPT_ERROR_CHARS, "No error logs available");
        format!(
            "## Task Description\n{task}\n\n## Code Diff\n```\n{diff}\n```\n\n## Error Logs\n```\n{errors}\n```\n\nAnalyze the root cause of this test failure."
        )
    }
}

/// User message for the rule-synthesis call.
pub fn rule_message(narrative: &str) -> String {
    format!(
        "Based on this root cause analysis, generate a preventive rule:\n\n{narrative}\n\nRemember: Output ONLY the rule in the exact format specified. No additional text."
    )
}
