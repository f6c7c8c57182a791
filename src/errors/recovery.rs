// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::HypoflowError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for an error, looking through step failures
    pub fn for_error(error: &HypoflowError) -> Option<Self> {
        match error.root_cause() {
            HypoflowError::MissingApiKey { var } => Some(Self::set_api_key(var)),
            HypoflowError::ConfigNotFound { .. } => Some(Self::create_config()),
            HypoflowError::CircularDependency { steps } => {
                Some(Self::fix_circular_dependency(steps))
            }
            HypoflowError::HttpStatus {
                service, status, ..
            } => Some(Self::check_service(service, *status)),
            HypoflowError::Http { .. } => Some(Self::check_connectivity()),
            _ => None,
        }
    }

    /// Suggest exporting a missing API key
    pub fn set_api_key(var: &str) -> Self {
        Self {
            action: format!("Set {}", var),
            steps: vec![
                format!("The service adapter reads its key from ${}", var),
                "Export the variable in your shell, or change api_key_env in the config".into(),
            ],
            commands: vec![format!("export {}=<your key>", var)],
        }
    }

    /// Suggest creating a configuration file
    pub fn create_config() -> Self {
        Self {
            action: "Create a configuration file".into(),
            steps: vec![
                "The config file passed with --config does not exist".into(),
                "Generate a default one and edit the service settings".into(),
            ],
            commands: vec!["hypoflow init".into()],
        }
    }

    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(steps: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", steps.join(" → ")),
                "Each step may only consume outputs of steps added before it".into(),
            ],
            commands: vec![
                "# Visualize the workflow:".into(),
                "hypoflow graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest checking a service that answered with an error status
    pub fn check_service(service: &str, status: u16) -> Self {
        let hint = match status {
            401 | 403 => "The API key was rejected; check that it is valid for this endpoint",
            404 => "The endpoint or model was not found; check base_url and model",
            429 => "The service is rate limiting requests; wait and retry the run",
            500..=599 => "The service reported an internal error; retry later",
            _ => "Inspect the response body above for details",
        };

        Self {
            action: format!("Check the {} service (HTTP {})", service, status),
            steps: vec![hint.into()],
            commands: vec![],
        }
    }

    /// Suggest checking network connectivity
    pub fn check_connectivity() -> Self {
        Self {
            action: "Check network connectivity".into(),
            steps: vec![
                "The request never reached the service or timed out".into(),
                "Verify base_url and raise timeout_secs for long research queries".into(),
            ],
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_looks_through_step_failure() {
        let err = HypoflowError::step_failed(
            "enhancedLiteratureReview",
            "Enhanced Literature Review",
            HypoflowError::MissingApiKey {
                var: "PERPLEXITY_API_KEY".into(),
            },
        );

        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        assert!(suggestion.action.contains("PERPLEXITY_API_KEY"));
        assert!(suggestion.to_string().contains("export PERPLEXITY_API_KEY"));
    }

    #[test]
    fn test_rate_limit_hint() {
        let suggestion = RecoverySuggestion::check_service("generation", 429);
        assert!(suggestion.steps[0].contains("rate limiting"));
    }

    #[test]
    fn test_no_suggestion_for_contract_violation() {
        let err = HypoflowError::contract("review", "missing field `score`");
        assert!(RecoverySuggestion::for_error(&err).is_none());
    }
}
