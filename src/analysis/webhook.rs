//! Webhook analysis backend: one JSON POST per failure.

use colored::Colorize;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

use super::{AnalysisBackend, AnalysisResult, ErrorKind, FailureSignal};

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Posts `{diff, error_logs, task_description}` and reads back
/// `{analysis, rule, error_type}`.
#[derive(Debug, Clone)]
pub struct WebhookBackend {
    client: Client,
    url: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    diff: &'a str,
    error_logs: &'a str,
    task_description: &'a str,
}

/// Why a webhook call produced no usable response.
enum WebhookFailure {
    Timeout,
    Request(String),
    InvalidResponse(String),
}

impl WebhookBackend {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("relearn/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            timeout_secs,
        })
    }

    fn post(&self, signal: &FailureSignal) -> Result<serde_json::Value, WebhookFailure> {
        let payload = WebhookPayload {
            diff: signal.bounded_diff(),
            error_logs: signal.bounded_error(),
            task_description: &signal.task_description,
        };

        tracing::info!(
            url = %self.url,
            diff_len = payload.diff.len(),
            error_len = payload.error_logs.len(),
            "posting failure to analysis webhook"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookFailure::Request(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response.text().map_err(transport_failure)?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| WebhookFailure::InvalidResponse(e.to_string()))?;

        if !value.is_object() {
            return Err(WebhookFailure::InvalidResponse(
                "response body is not a JSON object".to_string(),
            ));
        }
        Ok(value)
    }
}

fn transport_failure(err: reqwest::Error) -> WebhookFailure {
    if err.is_timeout() {
        WebhookFailure::Timeout
    } else {
        WebhookFailure::Request(err.to_string())
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

impl AnalysisBackend for WebhookBackend {
    fn name(&self) -> &str {
        "webhook"
    }

    fn analyze(&self, signal: &FailureSignal) -> AnalysisResult {
        match self.post(signal) {
            Ok(value) => AnalysisResult {
                narrative: string_field(&value, "analysis").unwrap_or_default(),
                rule: string_field(&value, "rule").unwrap_or_default(),
                error_kind: string_field(&value, "error_type")
                    .map(|label| ErrorKind::from(label.as_str()))
                    .unwrap_or(ErrorKind::TestFailure),
            },
            Err(WebhookFailure::Timeout) => {
                tracing::warn!(timeout_secs = self.timeout_secs, "analysis webhook timed out");
                println!(
                    "  {} Webhook timeout after {}s",
                    "⚠".yellow(),
                    self.timeout_secs
                );
                AnalysisResult::failed(ErrorKind::Timeout)
            }
            Err(WebhookFailure::Request(reason)) => {
                tracing::warn!(%reason, "analysis webhook request failed");
                println!("  {} Webhook request failed: {reason}", "⚠".yellow());
                AnalysisResult::failed(ErrorKind::RequestFailed)
            }
            Err(WebhookFailure::InvalidResponse(reason)) => {
                tracing::warn!(%reason, "analysis webhook returned an invalid body");
                println!("  {} Invalid JSON response from webhook", "⚠".yellow());
                AnalysisResult::failed(ErrorKind::InvalidResponse)
            }
        }
    }
}
