//! Shared setup for command handlers: configuration and analysis wiring.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::analysis::{build_backend, AnalysisBackend, Classifier};
use crate::config::{AnalysisMode, RelearnConfig};
use crate::fs::RuleStore;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub teacher: Option<AnalysisMode>,
    pub knowledge_file: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Load the config file (or defaults) and apply the overrides.
    pub fn load(&self) -> Result<RelearnConfig> {
        let mut config = RelearnConfig::load(self.config_path.as_deref()).with_context(|| {
            match &self.config_path {
                Some(path) => format!("Failed to load config: {}", path.display()),
                None => "Failed to load config".to_string(),
            }
        })?;

        if let Some(mode) = self.teacher {
            tracing::info!(%mode, "analysis mode overridden on command line");
            config.analysis.mode = mode;
        }
        if let Some(path) = &self.knowledge_file {
            config.knowledge.path = Some(path.clone());
        }
        Ok(config)
    }
}

/// Build the analysis backend and rule store described by `config`.
pub(crate) fn analysis_components(
    config: &RelearnConfig,
) -> Result<(Box<dyn AnalysisBackend>, RuleStore)> {
    let classifier = Classifier::from_config(&config.classifier)
        .context("Invalid classifier configuration")?;
    let backend = build_backend(config, classifier)?;
    let knowledge = config
        .knowledge
        .resolve_path()
        .context("Failed to resolve knowledge file path")?;
    Ok((backend, RuleStore::new(knowledge)))
}
