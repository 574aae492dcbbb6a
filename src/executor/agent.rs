//! Coding-agent invocation.

use std::borrow::Cow;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::process::run_with_timeout;
use super::{AttemptResult, ExecError, Stage};
use crate::config::AgentConfig;

/// Arguments passed to the agent program after its name.
///
/// Headless prompt mode, a fixed output format, permission prompts bypassed,
/// and a bounded number of turns.
pub fn agent_args(task: &str, config: &AgentConfig) -> Vec<String> {
    vec![
        "-p".to_string(),
        task.to_string(),
        "--output-format".to_string(),
        config.output_format.clone(),
        "--dangerously-skip-permissions".to_string(),
        "--max-turns".to_string(),
        config.max_turns.to_string(),
    ]
}

/// Render the agent invocation for logs, shell-quoted.
pub fn display_command(task: &str, config: &AgentConfig) -> String {
    std::iter::once(config.program.clone())
        .chain(agent_args(task, config))
        .map(|arg| shell_escape::escape(Cow::Owned(arg)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Launch the coding agent on `task` inside `project_root`.
///
/// A non-zero exit is returned as a normal result; only a timeout or a spawn
/// failure is an error.
pub fn run_agent(
    task: &str,
    config: &AgentConfig,
    project_root: &Path,
) -> Result<AttemptResult, ExecError> {
    let mut cmd = Command::new(&config.program);
    cmd.args(agent_args(task, config)).current_dir(project_root);

    tracing::debug!(command = %display_command(task, config), "launching agent");

    let output = run_with_timeout(
        cmd,
        &config.program,
        Duration::from_secs(config.timeout_secs),
    )?;

    if output.timed_out {
        return Err(ExecError::Timeout {
            stage: Stage::Agent,
            secs: config.timeout_secs,
        });
    }

    tracing::debug!(
        exit_code = ?output.exit_code,
        elapsed_ms = output.duration.as_millis() as u64,
        "agent finished"
    );
    Ok(AttemptResult::from_process(output))
}
