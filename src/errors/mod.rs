// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Error types
//!
//! Every failure in a workflow run surfaces as a single [`HypoflowError`]
//! naming the step that failed and the underlying cause.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for hypoflow operations
pub type HypoflowResult<T> = Result<T, HypoflowError>;

/// Main error type for hypoflow
#[derive(Error, Debug, Diagnostic)]
pub enum HypoflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Workflow Construction Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Workflow '{workflow}' has no steps")]
    #[diagnostic(
        code(hypoflow::empty_workflow),
        help("Append at least one step with .then() before committing")
    )]
    EmptyWorkflow { workflow: String },

    #[error("Duplicate step id: '{step}'")]
    #[diagnostic(code(hypoflow::duplicate_step))]
    DuplicateStep { step: String },

    #[error("Circular dependency detected: {}", .steps.join(" → "))]
    #[diagnostic(
        code(hypoflow::circular_dependency),
        help("Review your step dependencies to remove the cycle")
    )]
    CircularDependency { steps: Vec<String> },

    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    #[diagnostic(
        code(hypoflow::unknown_dependency),
        help("Check that '{dependency}' is added to the workflow")
    )]
    UnknownDependency { step: String, dependency: String },

    #[error("Step '{step}' consumes '{dependency}', which is scheduled after it")]
    #[diagnostic(
        code(hypoflow::forward_dependency),
        help("Move '{dependency}' earlier in the workflow")
    )]
    ForwardDependency { step: String, dependency: String },

    #[error("Step '{step}' requires '{dependency}', but that step is gated and may be skipped")]
    #[diagnostic(
        code(hypoflow::required_gated_dependency),
        help("Declare the dependency as optional and handle its absence")
    )]
    RequiredGatedDependency { step: String, dependency: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Run Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid trigger: {reason}")]
    #[diagnostic(code(hypoflow::invalid_trigger))]
    InvalidTrigger { reason: String },

    #[error("Failed during {step}: {source}")]
    #[diagnostic(code(hypoflow::step_failed))]
    StepFailed {
        step_id: String,
        step: String,
        #[source]
        source: Box<HypoflowError>,
    },

    #[error("Step '{step}' read '{dependency}' without declaring it as a dependency")]
    #[diagnostic(code(hypoflow::undeclared_dependency))]
    UndeclaredDependency { step: String, dependency: String },

    #[error("No output recorded for step '{step}'")]
    #[diagnostic(code(hypoflow::missing_output))]
    MissingOutput { step: String },

    #[error("Output for step '{step}' was already recorded")]
    #[diagnostic(code(hypoflow::output_already_written))]
    OutputAlreadyWritten { step: String },

    #[error("Value does not satisfy the '{contract}' contract: {reason}")]
    #[diagnostic(code(hypoflow::contract_violation))]
    ContractViolation { contract: String, reason: String },

    #[error("Comparison returned '{verdict}', expected \"1\" or \"2\"")]
    #[diagnostic(code(hypoflow::invalid_verdict))]
    InvalidVerdict { verdict: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Service Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Generation failed for {role}: {message}")]
    #[diagnostic(code(hypoflow::generation_failed))]
    Generation { role: String, message: String },

    #[error("Error performing deep research: {message}")]
    #[diagnostic(code(hypoflow::research_failed))]
    Research { message: String },

    #[error("{service} service returned HTTP {status}: {body}")]
    #[diagnostic(code(hypoflow::http_status))]
    HttpStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {message}")]
    #[diagnostic(code(hypoflow::http_error))]
    Http { message: String },

    #[error("API key environment variable '{var}' is not set")]
    #[diagnostic(
        code(hypoflow::missing_api_key),
        help("Export {var} or point api_key_env at another variable in your config")
    )]
    MissingApiKey { var: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration & IO Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Config file not found: {path}")]
    #[diagnostic(
        code(hypoflow::config_not_found),
        help("Create one with 'hypoflow init' or omit --config to use defaults")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(hypoflow::invalid_config))]
    InvalidConfig { reason: String },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(hypoflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(hypoflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(hypoflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(hypoflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(hypoflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(hypoflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for HypoflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for HypoflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for HypoflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for HypoflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<reqwest::Error> for HypoflowError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http { message: e.to_string() }
    }
}

impl HypoflowError {
    /// Wrap an error raised while a step ran with that step's identity
    pub fn step_failed(step_id: &str, step: &str, source: HypoflowError) -> Self {
        Self::StepFailed {
            step_id: step_id.to_string(),
            step: step.to_string(),
            source: Box::new(source),
        }
    }

    /// Create a contract violation for a named contract
    pub fn contract(contract: &str, reason: impl std::fmt::Display) -> Self {
        Self::ContractViolation {
            contract: contract.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a generation failure for an agent role
    pub fn generation(role: &str, message: impl Into<String>) -> Self {
        Self::Generation {
            role: role.to_string(),
            message: message.into(),
        }
    }

    /// The id of the failed step, if this is a step failure
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    /// Unwrap step failures down to the error that caused them
    pub fn root_cause(&self) -> &HypoflowError {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
