// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Run context
//!
//! Holds the trigger payload and every completed step's output for a single
//! workflow run. Outputs are written once under the producing step's id and
//! never rolled back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{HypoflowError, HypoflowResult};
use crate::pipeline::contract::{self, Contract};

/// Payload that starts a workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Research goal in natural language
    pub goal: String,

    /// Optional evaluation preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
}

impl Trigger {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }

    /// Reject triggers that cannot seed a run
    pub fn validate(&self) -> HypoflowResult<()> {
        if self.goal.trim().is_empty() {
            return Err(HypoflowError::InvalidTrigger {
                reason: "goal must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// A declared read of another step's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Output must be present when the step runs
    Required(&'static str),
    /// Output may be absent (its producer is gated)
    Optional(&'static str),
}

impl Dependency {
    /// Id of the producing step
    pub fn step_id(&self) -> &'static str {
        match self {
            Self::Required(id) | Self::Optional(id) => id,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

/// Accumulated state of one workflow run
#[derive(Debug)]
pub struct RunContext {
    trigger: Trigger,
    outputs: HashMap<String, Value>,
    completed: Vec<String>,
}

impl RunContext {
    /// Seed a context with the trigger payload
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            outputs: HashMap::new(),
            completed: Vec::new(),
        }
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Whether a step's output has been recorded
    pub fn contains(&self, step_id: &str) -> bool {
        self.outputs.contains_key(step_id)
    }

    /// Raw JSON output of a step
    pub fn raw(&self, step_id: &str) -> Option<&Value> {
        self.outputs.get(step_id)
    }

    /// Typed output of a step, failing if it is absent
    pub fn get<T: Contract>(&self, step_id: &str) -> HypoflowResult<T> {
        self.get_optional(step_id)?
            .ok_or_else(|| HypoflowError::MissingOutput {
                step: step_id.to_string(),
            })
    }

    /// Typed output of a step, or `None` if the step did not run
    pub fn get_optional<T: Contract>(&self, step_id: &str) -> HypoflowResult<Option<T>> {
        self.outputs
            .get(step_id)
            .map(|value| contract::decode(value.clone()))
            .transpose()
    }

    /// Record a step's output; each key may be written once
    pub(crate) fn record(&mut self, step_id: &str, output: Value) -> HypoflowResult<()> {
        if self.outputs.contains_key(step_id) {
            return Err(HypoflowError::OutputAlreadyWritten {
                step: step_id.to_string(),
            });
        }
        self.outputs.insert(step_id.to_string(), output);
        self.completed.push(step_id.to_string());
        Ok(())
    }

    /// Ids of steps with recorded output, in completion order
    pub fn completed(&self) -> &[String] {
        &self.completed
    }
}

/// A step's read-only view of the run context
///
/// Reads are restricted to the dependencies the step declared, so a step
/// cannot quietly couple itself to an output it never announced.
pub struct StepInput<'a> {
    step: &'a str,
    context: &'a RunContext,
    dependencies: &'a [Dependency],
}

impl<'a> StepInput<'a> {
    pub fn new(step: &'a str, context: &'a RunContext, dependencies: &'a [Dependency]) -> Self {
        Self {
            step,
            context,
            dependencies,
        }
    }

    pub fn trigger(&self) -> &Trigger {
        self.context.trigger()
    }

    /// Output of a required dependency
    pub fn required<T: Contract>(&self, step_id: &str) -> HypoflowResult<T> {
        self.check_declared(step_id)?;
        self.context.get(step_id)
    }

    /// Output of a dependency that may not have run
    pub fn optional<T: Contract>(&self, step_id: &str) -> HypoflowResult<Option<T>> {
        self.check_declared(step_id)?;
        self.context.get_optional(step_id)
    }

    /// Whether a declared dependency produced output
    pub fn has(&self, step_id: &str) -> HypoflowResult<bool> {
        self.check_declared(step_id)?;
        Ok(self.context.contains(step_id))
    }

    fn check_declared(&self, step_id: &str) -> HypoflowResult<()> {
        if self.dependencies.iter().any(|d| d.step_id() == step_id) {
            Ok(())
        } else {
            Err(HypoflowError::UndeclaredDependency {
                step: self.step.to_string(),
                dependency: step_id.to_string(),
            })
        }
    }
}
