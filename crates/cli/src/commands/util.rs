use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use fingerprint_core::config::FingerprintConfig;
use fingerprint_core::features::SolverSettings;
use fingerprint_core::model::{Corpus, MethodRecord};
use fingerprint_core::search::SearchBudget;
use log::debug;

/// Load the method records of a corpus file (JSON or YAML).
pub fn load_corpus(path: &Path) -> Result<Vec<MethodRecord>> {
    let corpus = Corpus::load(path)
        .with_context(|| format!("Failed to load corpus from {}", path.display()))?;
    debug!("Loaded {} method(s) from {}", corpus.methods.len(), path.display());
    Ok(corpus.methods)
}

/// Command-line overrides applied on top of a config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub no_return_type: bool,
    pub no_parameters: bool,
    pub no_strings: bool,
    pub no_access_flags: bool,
    pub max_branches: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Switch off the categories named on the command line and replace budget
    /// ceilings that were given explicitly.
    pub fn apply(&self, mut config: FingerprintConfig) -> FingerprintConfig {
        let settings: &mut SolverSettings = &mut config.settings;
        if self.no_return_type {
            settings.use_return_type = false;
        }
        if self.no_parameters {
            settings.use_parameters = false;
        }
        if self.no_strings {
            settings.use_strings = false;
        }
        if self.no_access_flags {
            settings.use_access_flags = false;
        }

        let budget: &mut SearchBudget = &mut config.budget;
        if let Some(max_branches) = self.max_branches {
            *budget = budget.clone().with_max_branches(max_branches);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            *budget = budget.clone().with_max_duration(Duration::from_millis(timeout_ms));
        }
        config
    }
}

/// Load the optional config file and layer the command-line overrides on top.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<FingerprintConfig> {
    let base = match path {
        Some(path) => FingerprintConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FingerprintConfig::default(),
    };
    Ok(overrides.apply(base))
}
