//! Append-only knowledge file holding learned rules.
//!
//! Rules are appended under a single `## Learned Rules & Patterns` section that
//! is created on first use. Prior content is never rewritten, reordered or
//! deduplicated.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Marker whose presence means the section header was already written.
pub const RULES_SECTION_HEADER: &str = "## Learned Rules & Patterns";

const RULES_SECTION_DESCRIPTION: &str = "Rules automatically generated from the Prompt Learning Loop.";

/// A single persisted rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub rule_text: String,
    pub timestamp: DateTime<Local>,
    pub source_label: String,
}

impl RuleEntry {
    pub fn new(rule_text: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            rule_text: rule_text.into(),
            timestamp: Local::now(),
            source_label: source_label.into(),
        }
    }

    /// Markdown block: the rule verbatim, then a source line.
    pub fn to_markdown(&self) -> String {
        format!(
            "\n{}\n  - **Source**: Learned on {} from {}\n",
            self.rule_text,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.source_label
        )
    }
}

/// Knowledge file at an explicit path.
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `rule_text` tagged with `source_label`.
    ///
    /// Returns `Ok(false)` without touching the file when the rule is empty or
    /// whitespace-only.
    pub fn append_rule(&self, rule_text: &str, source_label: &str) -> Result<bool> {
        if rule_text.trim().is_empty() {
            tracing::info!(source = source_label, "no rule to append (empty)");
            return Ok(false);
        }

        let entry = RuleEntry::new(rule_text, source_label);
        self.append_entry(&entry)?;
        Ok(true)
    }

    /// Append a pre-built entry, writing the section header first if absent.
    pub fn append_entry(&self, entry: &RuleEntry) -> Result<()> {
        // only scanned for the header, so invalid UTF-8 elsewhere is tolerated
        let existing = match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read knowledge file: {}", self.path.display())
                })
            }
        };

        let mut block = String::new();
        if !existing.contains(RULES_SECTION_HEADER) {
            block.push_str(&format!(
                "\n{RULES_SECTION_HEADER}\n\n{RULES_SECTION_DESCRIPTION}\n\n"
            ));
        }
        block.push_str(&entry.to_markdown());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open knowledge file: {}", self.path.display()))?;

        file.write_all(block.as_bytes())
            .with_context(|| format!("Failed to append rule: {}", self.path.display()))?;

        tracing::info!(
            path = %self.path.display(),
            source = %entry.source_label,
            "rule appended"
        );
        Ok(())
    }
}
