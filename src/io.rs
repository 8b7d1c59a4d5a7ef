//! Document formats and file dispatch
//!
//! Graphs, layout configs and layout results are plain serde documents. The
//! format is chosen from the file extension: `.json` for JSON, `.yaml` or
//! `.yml` for YAML.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::SimulationError;

/// Errors that can occur while loading inputs or writing results
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document was read but does not describe a valid simulation
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Result type for loading and writing documents
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A supported document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// File extensions this format is read from and written to
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Json => &["json"],
            Format::Yaml => &["yaml", "yml"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        [Format::Json, Format::Yaml]
            .into_iter()
            .find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Pick the format for `path` based on its extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnknownExtension(path.display().to_string()))?;

        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }

    pub fn parse<T: DeserializeOwned>(self, text: &str) -> ConfigResult<T> {
        Ok(match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T) -> ConfigResult<String> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?,
            Format::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Read and parse the document at `path`
pub fn read_document<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)?;
    format.parse(&text)
}

/// Serialize `value` to `path` in the format its extension names
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> ConfigResult<()> {
    let format = Format::from_path(path)?;
    fs::write(path, format.render(value)?)?;
    Ok(())
}
