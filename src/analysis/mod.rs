//! Failure analysis: turns a failure signal into a narrative and a rule.
//!
//! Two interchangeable backends sit behind [`AnalysisBackend`]:
//! - [`DirectBackend`] calls the reasoning service twice (root cause, then rule
//!   synthesis) and falls back to the webhook when it has no credential
//! - [`WebhookBackend`] posts one payload to a remote webhook
//!
//! `analyze` never fails. Every problem is folded into an [`AnalysisResult`]
//! with an empty rule and a descriptive [`ErrorKind`].

pub mod anthropic;
pub mod classify;
pub mod direct;
pub mod prompts;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_server;

use std::fmt;
use std::str::FromStr;

use crate::config::{AnalysisMode, RelearnConfig};
use crate::error::SetupError;
use crate::utils::cap;

pub use anthropic::{AnthropicClient, ReasoningClient, ReasoningError};
pub use classify::{Classifier, ClassifierRule, ErrorKind};
pub use direct::DirectBackend;
pub use webhook::WebhookBackend;

/// Diff cap applied before any network transmission.
pub const MAX_DIFF_CHARS: usize = 10_000;
/// Error-text cap applied before any network transmission.
pub const MAX_ERROR_CHARS: usize = 5_000;

/// Family of failure being analyzed; selects the prompt framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FailureFamily {
    /// Automated verification failed
    #[default]
    TestFailure,
    /// Wrong approach or misread requirements
    PlanningError,
    /// Missed existing infrastructure, created duplicates
    IntegrationError,
    /// Workflow design issues
    WorkflowError,
    /// Wrong design patterns or structure
    ArchitectureError,
    /// Over-engineered or under-scoped solution
    ScopeError,
    /// Missing or wrong configuration
    ConfigError,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown failure kind: {0} (use: planning_error, integration_error, workflow_error, architecture_error, scope_error, config_error, other)")]
pub struct UnknownFailureKind(pub String);

impl FailureFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureFamily::TestFailure => "test_failure",
            FailureFamily::PlanningError => "planning_error",
            FailureFamily::IntegrationError => "integration_error",
            FailureFamily::WorkflowError => "workflow_error",
            FailureFamily::ArchitectureError => "architecture_error",
            FailureFamily::ScopeError => "scope_error",
            FailureFamily::ConfigError => "config_error",
            FailureFamily::Other => "other",
        }
    }

    /// Process failures are described by context, not by a code diff.
    pub fn is_process_failure(&self) -> bool {
        !matches!(self, FailureFamily::TestFailure | FailureFamily::Other)
    }
}

impl fmt::Display for FailureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureFamily {
    type Err = UnknownFailureKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "test_failure" => Ok(FailureFamily::TestFailure),
            "planning_error" | "planning" => Ok(FailureFamily::PlanningError),
            "integration_error" | "integration" => Ok(FailureFamily::IntegrationError),
            "workflow_error" | "workflow" => Ok(FailureFamily::WorkflowError),
            "architecture_error" | "architecture" => Ok(FailureFamily::ArchitectureError),
            "scope_error" | "scope" => Ok(FailureFamily::ScopeError),
            "config_error" | "config" => Ok(FailureFamily::ConfigError),
            "other" => Ok(FailureFamily::Other),
            _ => Err(UnknownFailureKind(s.to_string())),
        }
    }
}

/// Input to a backend: what changed, what failed, and what was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSignal {
    pub diff_text: String,
    pub error_text: String,
    pub task_description: String,
    pub family: FailureFamily,
}

impl FailureSignal {
    /// Signal for a failed test run.
    pub fn from_test_failure(
        diff_text: impl Into<String>,
        error_text: impl Into<String>,
        task_description: impl Into<String>,
    ) -> Self {
        Self {
            diff_text: diff_text.into(),
            error_text: error_text.into(),
            task_description: task_description.into(),
            family: FailureFamily::TestFailure,
        }
    }

    /// Signal for a manually reported failure.
    ///
    /// The context stands in for the diff and the description for the error log.
    pub fn from_report(family: FailureFamily, description: &str, context: &str, task: &str) -> Self {
        Self {
            diff_text: format!("## Context\n{context}"),
            error_text: format!("## Failure Description\n{description}"),
            task_description: task.to_string(),
            family,
        }
    }

    /// Diff capped at `MAX_DIFF_CHARS`. The stored text is untouched.
    pub fn bounded_diff(&self) -> &str {
        cap(&self.diff_text, MAX_DIFF_CHARS)
    }

    /// Error text capped at `MAX_ERROR_CHARS`. The stored text is untouched.
    pub fn bounded_error(&self) -> &str {
        cap(&self.error_text, MAX_ERROR_CHARS)
    }
}

/// What a backend produced. An empty `rule` means no actionable rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisResult {
    pub narrative: String,
    pub rule: String,
    pub error_kind: ErrorKind,
}

impl AnalysisResult {
    /// A result carrying only an error kind.
    pub fn failed(error_kind: ErrorKind) -> Self {
        Self {
            narrative: String::new(),
            rule: String::new(),
            error_kind,
        }
    }

    pub fn has_rule(&self) -> bool {
        !self.rule.trim().is_empty()
    }
}

/// Converts a failure signal into a narrative and a preventive rule.
pub trait AnalysisBackend {
    /// Short backend name for progress output.
    fn name(&self) -> &str;

    /// Analyze a failure. Never fails; problems are reported through `error_kind`.
    fn analyze(&self, signal: &FailureSignal) -> AnalysisResult;
}

/// Construct the backend selected by `config.analysis.mode`.
///
/// Fails only when no analysis path can work at all: webhook mode without a
/// URL, or direct mode with neither a credential nor a webhook to fall back to.
pub fn build_backend(
    config: &RelearnConfig,
    classifier: Classifier,
) -> Result<Box<dyn AnalysisBackend>, SetupError> {
    let webhook = match &config.webhook.url {
        Some(url) => Some(
            WebhookBackend::new(url, config.webhook.timeout_secs)
                .map_err(|e| SetupError::NoAnalysisBackend(e.to_string()))?,
        ),
        None => None,
    };

    match config.analysis.mode {
        AnalysisMode::Webhook => match webhook {
            Some(backend) => Ok(Box::new(backend)),
            None => Err(SetupError::NoAnalysisBackend(
                "webhook mode requires webhook.url".to_string(),
            )),
        },
        AnalysisMode::Direct => {
            let client = match config.analysis.api_key() {
                Some(key) => {
                    let client = AnthropicClient::new(key, &config.analysis)
                        .map_err(|e| SetupError::NoAnalysisBackend(e.to_string()))?;
                    tracing::debug!(model = client.model(), "reasoning client ready");
                    Some(Box::new(client) as Box<dyn ReasoningClient>)
                }
                None => None,
            };

            if client.is_none() && webhook.is_none() {
                return Err(SetupError::NoAnalysisBackend(format!(
                    "{} is not set and no webhook.url is configured to fall back to",
                    config.analysis.api_key_env
                )));
            }

            Ok(Box::new(DirectBackend::new(
                client,
                webhook,
                classifier,
                &config.analysis,
            )))
        }
    }
}
