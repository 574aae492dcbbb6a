//! Anthropic Messages API client (blocking HTTP).
//!
//! One request per call: a system prompt plus a single user message, text back.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AnalysisConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    /// The service answered with a non-success status.
    #[error("Anthropic API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to reach Anthropic API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse Anthropic response: {0}")]
    Decode(String),

    #[error("Anthropic response contained no text")]
    EmptyResponse,
}

/// A remote reasoning service: system instructions and a user message in, text out.
pub trait ReasoningClient {
    fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, ReasoningError>;
}

/// Messages API client.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, config: &AnalysisConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("relearn/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ReasoningClient for AnthropicClient {
    fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, ReasoningError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        tracing::info!(
            model = %self.model,
            prompt_len = user.len(),
            max_tokens,
            "invoking Anthropic Messages API"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .map_err(ReasoningError::Transport)?;

        let status = response.status();
        let text = response.text().map_err(ReasoningError::Transport)?;

        if !status.is_success() {
            return Err(ReasoningError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| ReasoningError::Decode(e.to_string()))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| {
                if block.block_type == "text" {
                    block.text.as_deref()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(ReasoningError::EmptyResponse);
        }

        tracing::debug!(
            model = %parsed.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Anthropic response received"
        );

        Ok(content)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}
