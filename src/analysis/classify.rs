//! Failure classification by ordered pattern table.
//!
//! The classifier concatenates the analysis narrative and the raw error text
//! and returns the label of the first matching pattern. The table is data, so
//! new failure families are added by pushing rules, not by adding branches.

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::str::FromStr;

use crate::config::{ClassifierConfig, ConfigError};

/// Short label describing what kind of failure occurred.
///
/// Open enumeration: anything outside the built-in set is carried as `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // runtime exceptions
    TypeError,
    ValueError,
    AttributeError,
    KeyError,
    IndexError,
    ImportError,
    NameError,
    DivisionError,
    AssertionError,
    SyntaxError,
    RuntimeError,
    // process failures
    PlanningError,
    IntegrationError,
    WorkflowError,
    ScopeError,
    ConfigError,
    ArchitectureError,
    #[default]
    TestFailure,
    // analysis pipeline outcomes
    ApiError,
    AnalysisError,
    Timeout,
    RequestFailed,
    InvalidResponse,
    LocalAnalysisError,
    Custom(String),
}

const BUILTIN_KINDS: &[ErrorKind] = &[
    ErrorKind::TypeError,
    ErrorKind::ValueError,
    ErrorKind::AttributeError,
    ErrorKind::KeyError,
    ErrorKind::IndexError,
    ErrorKind::ImportError,
    ErrorKind::NameError,
    ErrorKind::DivisionError,
    ErrorKind::AssertionError,
    ErrorKind::SyntaxError,
    ErrorKind::RuntimeError,
    ErrorKind::PlanningError,
    ErrorKind::IntegrationError,
    ErrorKind::WorkflowError,
    ErrorKind::ScopeError,
    ErrorKind::ConfigError,
    ErrorKind::ArchitectureError,
    ErrorKind::TestFailure,
    ErrorKind::ApiError,
    ErrorKind::AnalysisError,
    ErrorKind::Timeout,
    ErrorKind::RequestFailed,
    ErrorKind::InvalidResponse,
    ErrorKind::LocalAnalysisError,
];

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::TypeError => "type_error",
            ErrorKind::ValueError => "value_error",
            ErrorKind::AttributeError => "attribute_error",
            ErrorKind::KeyError => "key_error",
            ErrorKind::IndexError => "index_error",
            ErrorKind::ImportError => "import_error",
            ErrorKind::NameError => "name_error",
            ErrorKind::DivisionError => "division_error",
            ErrorKind::AssertionError => "assertion_error",
            ErrorKind::SyntaxError => "syntax_error",
            ErrorKind::RuntimeError => "runtime_error",
            ErrorKind::PlanningError => "planning_error",
            ErrorKind::IntegrationError => "integration_error",
            ErrorKind::WorkflowError => "workflow_error",
            ErrorKind::ScopeError => "scope_error",
            ErrorKind::ConfigError => "config_error",
            ErrorKind::ArchitectureError => "architecture_error",
            ErrorKind::TestFailure => "test_failure",
            ErrorKind::ApiError => "api_error",
            ErrorKind::AnalysisError => "analysis_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RequestFailed => "request_failed",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::LocalAnalysisError => "local_analysis_error",
            ErrorKind::Custom(label) => label,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Ok(BUILTIN_KINDS
            .iter()
            .find(|kind| kind.as_str() == label)
            .cloned()
            .unwrap_or_else(|| ErrorKind::Custom(label.to_string())))
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pattern: Regex,
    kind: ErrorKind,
}

impl ClassifierRule {
    /// Compile a case-insensitive pattern.
    pub fn new(pattern: &str, kind: ErrorKind) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern, kind })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Built-in table: exception names first, then process-failure phrases.
const BUILTIN_PATTERNS: &[(&str, ErrorKind)] = &[
    (r"TypeError", ErrorKind::TypeError),
    (r"ValueError", ErrorKind::ValueError),
    (r"AttributeError", ErrorKind::AttributeError),
    (r"KeyError", ErrorKind::KeyError),
    (r"IndexError", ErrorKind::IndexError),
    (r"ImportError", ErrorKind::ImportError),
    (r"NameError", ErrorKind::NameError),
    (r"ZeroDivisionError", ErrorKind::DivisionError),
    (r"AssertionError", ErrorKind::AssertionError),
    (r"SyntaxError", ErrorKind::SyntaxError),
    (r"RuntimeError", ErrorKind::RuntimeError),
    (
        r"misunderstood|wrong approach|should have",
        ErrorKind::PlanningError,
    ),
    (r"redundant|duplicate|already exists", ErrorKind::IntegrationError),
    (
        r"scope.*creep|over-engineered|too complex",
        ErrorKind::ScopeError,
    ),
    (r"n8n|workflow.*design|node.*wrong", ErrorKind::WorkflowError),
    (
        r"credential|authentication.*missing|config",
        ErrorKind::ConfigError,
    ),
    (
        r"pattern.*wrong|architecture.*mismatch|design.*error",
        ErrorKind::ArchitectureError,
    ),
];

/// Ordered pattern table; first match wins, default `test_failure`.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
}

impl Classifier {
    /// An empty table. Everything classifies as `test_failure`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let rules = BUILTIN_PATTERNS
            .iter()
            .map(|(pattern, kind)| {
                ClassifierRule::new(pattern, kind.clone()).expect("built-in pattern is valid")
            })
            .collect();
        Self { rules }
    }

    /// Built-in table preceded by user patterns from configuration.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let mut rules = config
            .patterns
            .iter()
            .map(|p| {
                ClassifierRule::new(&p.pattern, ErrorKind::from(p.kind.as_str())).map_err(
                    |source| ConfigError::InvalidPattern {
                        pattern: p.pattern.clone(),
                        source,
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        rules.extend(Self::builtin().rules);
        Ok(Self { rules })
    }

    /// Append a rule at the lowest priority.
    pub fn push(&mut self, rule: ClassifierRule) {
        self.rules.push(rule);
    }

    /// Label for a failure given its narrative and raw error text.
    pub fn classify(&self, narrative: &str, error_text: &str) -> ErrorKind {
        let combined = format!("{narrative} {error_text}");
        self.rules
            .iter()
            .find(|rule| rule.matches(&combined))
            .map(|rule| rule.kind.clone())
            .unwrap_or_default()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builtin()
    }
}
