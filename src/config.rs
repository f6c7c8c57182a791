// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Configuration loading
//!
//! Settings come from `.hypoflow.yaml` (or `.hypoflow.toml`) in the working
//! directory, then the user config directory. Missing files mean defaults.
//! API keys never live in the file; it only names the environment variable
//! holding each key.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{HypoflowError, HypoflowResult};
use crate::tournament::Tournament;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".hypoflow.yaml";

const TOML_CONFIG_FILE: &str = ".hypoflow.toml";

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Structured-generation service
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Web research service
    #[serde(default)]
    pub research: ResearchSettings,

    /// Tournament ranking
    #[serde(default)]
    pub ranking: Tournament,
}

/// Settings for the OpenAI-compatible generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
            temperature: None,
        }
    }
}

/// Settings for the deep research service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Deep research can take many minutes
    pub timeout_secs: u64,
    /// Stream the answer as server-sent events
    pub streaming: bool,
    /// Extra instructions appended to the research system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            model: "sonar-deep-research".to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            timeout_secs: 900,
            streaming: false,
            instructions: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> HypoflowResult<Self> {
        if !path.exists() {
            return Err(HypoflowError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HypoflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let settings: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        settings.validate()?;

        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load from an explicit path, or search the default locations
    pub fn load(explicit: Option<&Path>) -> HypoflowResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// First existing config file in the search order
    pub fn discover() -> Option<PathBuf> {
        let mut candidates = vec![
            PathBuf::from(DEFAULT_CONFIG_FILE),
            PathBuf::from(TOML_CONFIG_FILE),
        ];
        if let Some(dir) = user_config_dir() {
            candidates.push(dir.join("config.yaml"));
        }
        candidates.into_iter().find(|p| p.is_file())
    }

    /// Save as YAML
    pub fn save(&self, path: &Path) -> HypoflowResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|e| HypoflowError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn validate(&self) -> HypoflowResult<()> {
        if self.generation.model.trim().is_empty() {
            return Err(HypoflowError::InvalidConfig {
                reason: "generation.model must not be empty".into(),
            });
        }
        if self.research.model.trim().is_empty() {
            return Err(HypoflowError::InvalidConfig {
                reason: "research.model must not be empty".into(),
            });
        }
        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(HypoflowError::InvalidConfig {
                    reason: format!("generation.temperature must be within [0, 2], got {}", t),
                });
            }
        }
        Ok(())
    }
}

/// Per-user configuration directory
pub fn user_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hypoflow").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Read an API key from the named environment variable
pub fn api_key(var: &str) -> HypoflowResult<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(HypoflowError::MissingApiKey {
            var: var.to_string(),
        }),
    }
}

/// Commented default configuration written by `hypoflow init`
pub fn generate_default_config() -> String {
    r#"# hypoflow configuration

generation:
  base_url: "https://api.openai.com/v1"
  model: "gpt-4o"
  api_key_env: "OPENAI_API_KEY"
  timeout_secs: 300
  # temperature: 0.7

research:
  base_url: "https://api.perplexity.ai"
  model: "sonar-deep-research"
  api_key_env: "PERPLEXITY_API_KEY"
  timeout_secs: 900
  streaming: false
  # instructions: "Prefer peer-reviewed sources"

ranking:
  # match_order: fold winners in the order matches were generated
  # completion: fold winners as judgements settle
  reduction: match_order
  # pass_through or drop
  singleton: pass_through
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{ReductionOrder, SingletonPolicy};
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let settings: Settings = serde_yaml::from_str(&generate_default_config()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "generation:\n  model: gpt-4o-mini\nranking:\n  reduction: completion\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.generation.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.research.model, "sonar-deep-research");
        assert_eq!(settings.ranking.reduction, ReductionOrder::Completion);
        assert_eq!(settings.ranking.singleton, SingletonPolicy::PassThrough);
    }

    #[test]
    fn test_toml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hypoflow.toml");
        std::fs::write(
            &path,
            "[research]\nstreaming = true\ninstructions = \"cite reviews\"\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert!(settings.research.streaming);
        assert_eq!(settings.research.instructions.as_deref(), Some("cite reviews"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/hypoflow.yaml"))).unwrap_err();
        assert!(matches!(err, HypoflowError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "generation:\n  temperature: 5.0\n").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(matches!(err, HypoflowError::InvalidConfig { .. }));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.yaml");
        let mut settings = Settings::default();
        settings.research.streaming = true;

        settings.save(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_api_key_missing() {
        let err = api_key("HYPOFLOW_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, HypoflowError::MissingApiKey { ref var } if var == "HYPOFLOW_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
