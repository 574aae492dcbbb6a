//! Direct analysis backend: two sequential calls to the reasoning service.
//!
//! 1. Root cause: family-specific system prompt over the diff and error text.
//! 2. Rule synthesis: the narrative alone, answered with one templated rule.
//!
//! The error kind comes from the [`Classifier`], not from the service.

use colored::Colorize;

use super::anthropic::{ReasoningClient, ReasoningError};
use super::prompts;
use super::{AnalysisBackend, AnalysisResult, Classifier, ErrorKind, FailureSignal, WebhookBackend};
use crate::config::AnalysisConfig;

pub struct DirectBackend {
    /// None when no credential was available at construction
    client: Option<Box<dyn ReasoningClient>>,
    fallback: Option<WebhookBackend>,
    classifier: Classifier,
    max_tokens: u32,
    rule_max_tokens: u32,
}

impl DirectBackend {
    pub fn new(
        client: Option<Box<dyn ReasoningClient>>,
        fallback: Option<WebhookBackend>,
        classifier: Classifier,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            client,
            fallback,
            classifier,
            max_tokens: config.max_tokens,
            rule_max_tokens: config.rule_max_tokens,
        }
    }

    fn analyze_with(&self, client: &dyn ReasoningClient, signal: &FailureSignal) -> AnalysisResult {
        let narrative = match client.complete(
            prompts::system_prompt(signal.family),
            &prompts::root_cause_message(signal),
            self.max_tokens,
        ) {
            Ok(text) => text,
            Err(err) => return reasoning_failure("root-cause", err),
        };

        let rule = match client.complete(
            prompts::RULE_GENERATOR_SYSTEM,
            &prompts::rule_message(&narrative),
            self.rule_max_tokens,
        ) {
            Ok(text) => text.trim().to_string(),
            Err(err) => return reasoning_failure("rule-synthesis", err),
        };

        let error_kind = self.classifier.classify(&narrative, &signal.error_text);
        tracing::debug!(%error_kind, rule_len = rule.len(), "direct analysis complete");

        AnalysisResult {
            narrative,
            rule,
            error_kind,
        }
    }
}

/// Map a failed reasoning call to a rule-less result.
///
/// Both calls share this mapping: a status reported by the service is
/// `api_error` with its message kept, anything else is `local_analysis_error`.
fn reasoning_failure(call: &str, err: ReasoningError) -> AnalysisResult {
    match err {
        ReasoningError::Api { .. } => {
            tracing::warn!(call, error = %err, "reasoning service rejected the request");
            AnalysisResult {
                narrative: format!("API error: {err}"),
                rule: String::new(),
                error_kind: ErrorKind::ApiError,
            }
        }
        _ => {
            tracing::warn!(call, error = %err, "reasoning call failed");
            println!("  {} Local analysis failed: {err}", "⚠".yellow());
            AnalysisResult::failed(ErrorKind::LocalAnalysisError)
        }
    }
}

impl AnalysisBackend for DirectBackend {
    fn name(&self) -> &str {
        "direct"
    }

    fn analyze(&self, signal: &FailureSignal) -> AnalysisResult {
        if let Some(client) = &self.client {
            return self.analyze_with(client.as_ref(), signal);
        }

        match &self.fallback {
            Some(webhook) => {
                tracing::warn!("no reasoning credential available, falling back to webhook");
                println!(
                    "  {} No reasoning credential available. Falling back to webhook mode...",
                    "⚠".yellow()
                );
                webhook.analyze(signal)
            }
            None => {
                tracing::warn!("no reasoning credential and no webhook configured");
                AnalysisResult::failed(ErrorKind::LocalAnalysisError)
            }
        }
    }
}
