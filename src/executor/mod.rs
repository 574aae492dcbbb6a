//! Attempt executor: runs the external coding agent and the test command.
//!
//! Both are blocking subprocess invocations bounded by a timeout. A timeout is
//! reported as `ExecError::Timeout`, distinct from a non-zero exit code.

pub mod agent;
pub mod process;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{AgentConfig, TestConfig};

pub use process::{run_with_timeout, ProcessOutput};

/// Captured output of one agent run or test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl AttemptResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, skipping whichever is empty.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (true, true) => String::new(),
        }
    }

    fn from_process(output: ProcessOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            // killed by signal: no code
            exit_code: output.exit_code.unwrap_or(-1),
        }
    }
}

/// Which external process an execution error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Agent,
    Tests,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Agent => write!(f, "agent"),
            Stage::Tests => write!(f, "tests"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: Stage, secs: u64 },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }
}

/// The two external invocations the learning loop performs per attempt.
pub trait Executor {
    /// Run the coding agent on `task`.
    fn run_agent(&self, task: &str) -> Result<AttemptResult, ExecError>;

    /// Run the configured test command. Exit code 0 is the only pass signal.
    fn run_tests(&self) -> Result<AttemptResult, ExecError>;
}

/// `Executor` that spawns real subprocesses inside the project directory.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    project_root: PathBuf,
    agent: AgentConfig,
    tests: TestConfig,
}

impl ProcessExecutor {
    pub fn new(project_root: impl Into<PathBuf>, agent: AgentConfig, tests: TestConfig) -> Self {
        Self {
            project_root: project_root.into(),
            agent,
            tests,
        }
    }
}

impl Executor for ProcessExecutor {
    fn run_agent(&self, task: &str) -> Result<AttemptResult, ExecError> {
        agent::run_agent(task, &self.agent, &self.project_root)
    }

    fn run_tests(&self) -> Result<AttemptResult, ExecError> {
        test_runner::run_tests(
            &self.tests.command,
            Duration::from_secs(self.tests.timeout_secs),
            &self.project_root,
        )
    }
}
