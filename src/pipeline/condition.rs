// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Run-time conditions for gated steps
//!
//! A condition is evaluated against the run context immediately before its
//! step would run. Like steps, conditions declare the outputs they read.

use std::fmt;
use std::sync::Arc;

use crate::errors::HypoflowResult;
use crate::pipeline::context::{Dependency, RunContext, StepInput};
use crate::pipeline::contract::Contract;

type Predicate = dyn Fn(&StepInput<'_>) -> HypoflowResult<bool> + Send + Sync;

/// Predicate gating a step
#[derive(Clone)]
pub struct Condition {
    label: String,
    reads: Vec<Dependency>,
    predicate: Arc<Predicate>,
}

impl Condition {
    /// Create a condition reading the given step outputs
    pub fn new<F>(label: impl Into<String>, reads: &[&'static str], predicate: F) -> Self
    where
        F: Fn(&StepInput<'_>) -> HypoflowResult<bool> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            reads: reads.iter().copied().map(Dependency::Required).collect(),
            predicate: Arc::new(predicate),
        }
    }

    /// Always run
    pub fn always() -> Self {
        Self::new("always", &[], |_| Ok(true))
    }

    /// Never run
    pub fn never() -> Self {
        Self::new("never", &[], |_| Ok(false))
    }

    /// True when a text field of a step's output contains any of the markers
    pub fn output_contains_any<T: Contract>(
        label: impl Into<String>,
        step_id: &'static str,
        field: fn(&T) -> &str,
        markers: &'static [&'static str],
    ) -> Self {
        Self::new(label, &[step_id], move |input| {
            let output: T = input.required(step_id)?;
            Ok(first_marker(field(&output), markers).is_some())
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Outputs the predicate reads
    pub fn reads(&self) -> &[Dependency] {
        &self.reads
    }

    /// Evaluate on behalf of the gated step `owner`
    pub fn evaluate(&self, owner: &str, context: &RunContext) -> HypoflowResult<bool> {
        let input = StepInput::new(owner, context, &self.reads);
        (self.predicate)(&input)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("label", &self.label)
            .field("reads", &self.reads)
            .finish()
    }
}

/// First marker found in `text`, as a literal, case-sensitive substring
pub fn first_marker(text: &str, markers: &[&'static str]) -> Option<&'static str> {
    markers.iter().copied().find(|marker| text.contains(marker))
}
