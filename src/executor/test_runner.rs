//! Verification runner: executes the project's test command.

use std::path::Path;
use std::time::Duration;

use super::process::{run_with_timeout, shell_command};
use super::{AttemptResult, ExecError, Stage};

/// Run `command_line` through the system shell inside `project_root`.
///
/// Exit code 0 is the sole success signal. A timeout is an error so the loop
/// can tell it apart from a failing suite.
pub fn run_tests(
    command_line: &str,
    timeout: Duration,
    project_root: &Path,
) -> Result<AttemptResult, ExecError> {
    let cmd = shell_command(command_line, project_root);
    let output = run_with_timeout(cmd, command_line, timeout)?;

    if output.timed_out {
        return Err(ExecError::Timeout {
            stage: Stage::Tests,
            secs: timeout.as_secs(),
        });
    }

    tracing::debug!(
        command = command_line,
        exit_code = ?output.exit_code,
        elapsed_ms = output.duration.as_millis() as u64,
        "tests finished"
    );
    Ok(AttemptResult::from_process(output))
}
