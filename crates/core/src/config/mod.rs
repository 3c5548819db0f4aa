//! Settings files and document loading.
//!
//! Both corpus files and solver configuration are plain serde documents. The
//! format is picked from the file extension: `.json`, `.yaml` or `.yml`.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::SolverSettings;
use crate::search::SearchBudget;

/// Error type for loading configuration and corpus documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse JSON document {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("Failed to parse YAML document {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },

    #[error("Unsupported document format for {0}; expected .json, .yaml or .yml")]
    UnsupportedFormat(PathBuf),
}

/// Document formats understood by [`load_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Some(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Parse a document body in the given format.
pub fn parse_document<T: DeserializeOwned>(
    body: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<T, ConfigError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(body)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source }),
        DocumentFormat::Yaml => serde_yaml::from_str(body)
            .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source }),
    }
}

/// Read and deserialize a JSON or YAML document from disk.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    let body = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse_document(&body, format, path)
}

/// Serializable solver configuration.
///
/// Every field is optional in the file; missing values fall back to defaults
/// (all feature categories on, no search budget).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    #[serde(default)]
    pub settings: SolverSettings,
    #[serde(default)]
    pub budget: SearchBudget,
}

impl FingerprintConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }
}
