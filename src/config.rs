//! Application configuration
//!
//! Every field has a compiled default; an optional JSON file overrides
//! them and command-line flags override the file.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Beam decoder settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub beam_width: usize,
    /// Exponent of the length penalty applied to finished hypotheses
    pub length_penalty: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            beam_width: 3,
            length_penalty: 0.7,
        }
    }
}

/// Markov generation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Attempts allowed before giving up on `min_length`; at least one is made
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            min_length: 4,
            max_length: 12,
            max_attempts: 1000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub decoder: DecoderConfig,
    pub generator: GeneratorConfig,
}

impl AppConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        tracing::debug!(?path, ?config, "loaded config");
        Ok(config)
    }

    /// Like [`AppConfig::load`] but falls back to defaults when no path is
    /// given or the file cannot be read.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            None => AppConfig::default(),
            Some(path) => AppConfig::load(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, ?path, "failed to load config, using defaults");
                AppConfig::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"decoder": {"beam_width": 5}}"#).unwrap();
        assert_eq!(config.decoder.beam_width, 5);
        assert_eq!(config.decoder.length_penalty, 0.7);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AppConfig::load_or_default(Some(Path::new("does/not/exist.json")));
        assert_eq!(config, AppConfig::default());
    }
}
