//! Configuration for the learning loop.
//!
//! Built-in defaults can be overridden by an optional YAML or TOML file. Each
//! group is `#[serde(default)]`, so a group given partially in the file keeps
//! the defaults for the keys it omits, and absent groups keep all defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_TEST_COMMAND: &str = "pytest tests/ -v --tb=short";

/// Knowledge file location relative to the home directory.
const KNOWLEDGE_FILE_SUFFIX: [&str; 2] = [".claude", "CLAUDE.md"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported config format: {0} (use .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid classifier pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot determine home directory for the default knowledge file")]
    NoHomeDirectory,

    #[error("unknown analysis mode: {0} (use: direct, webhook)")]
    UnknownMode(String),
}

/// Which analysis backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Two calls to the reasoning service, falling back to the webhook
    #[default]
    #[serde(alias = "local")]
    Direct,
    /// One POST to the configured webhook
    Webhook,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Direct => write!(f, "direct"),
            AnalysisMode::Webhook => write!(f, "webhook"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" | "local" => Ok(AnalysisMode::Direct),
            "webhook" | "n8n" => Ok(AnalysisMode::Webhook),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub model: String,
    /// Token budget for the root-cause call
    pub max_tokens: u32,
    /// Token budget for the rule-synthesis call
    pub rule_max_tokens: u32,
    pub api_url: String,
    /// Environment variable holding the reasoning-service credential
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Direct,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            rule_max_tokens: 512,
            api_url: DEFAULT_API_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
        }
    }
}

impl AnalysisConfig {
    /// Credential from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    #[serde(alias = "webhook_url")]
    pub url: Option<String>,
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Informational only; the command line decides what runs
    pub framework: String,
    pub command: String,
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            framework: "pytest".to_string(),
            command: DEFAULT_TEST_COMMAND.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub program: String,
    pub max_turns: u32,
    pub output_format: String,
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            max_turns: 15,
            output_format: "json".to_string(),
            timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Knowledge file; `<home>/.claude/CLAUDE.md` when unset
    pub path: Option<PathBuf>,
}

impl KnowledgeConfig {
    /// Configured path with a leading `~` expanded, or the default location.
    pub fn resolve_path(&self) -> Result<PathBuf, ConfigError> {
        let Some(path) = &self.path else {
            return default_knowledge_path();
        };
        match path.strip_prefix("~") {
            Ok(rest) => {
                let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
                Ok(home.join(rest))
            }
            Err(_) => Ok(path.clone()),
        }
    }
}

/// One user-supplied classifier rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Evaluated in order, before the built-in table
    pub patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelearnConfig {
    #[serde(alias = "teacher")]
    pub analysis: AnalysisConfig,
    #[serde(alias = "n8n")]
    pub webhook: WebhookConfig,
    pub tests: TestConfig,
    #[serde(alias = "claude")]
    pub agent: AgentConfig,
    pub knowledge: KnowledgeConfig,
    pub classifier: ClassifierConfig,
}

impl RelearnConfig {
    /// Load defaults, overlaid with `path` when given.
    ///
    /// A path that does not exist is logged and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                tracing::warn!(path = %p.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a config file, choosing the format by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content).map_err(|source| {
                ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                }
            }),
            Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// `<home>/.claude/CLAUDE.md`
pub fn default_knowledge_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(KNOWLEDGE_FILE_SUFFIX
        .iter()
        .fold(home, |path, part| path.join(part)))
}
