// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Step trait
//!
//! A step is a named unit of work with a typed input gathered from its
//! declared dependencies and a typed output recorded under its id.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::HypoflowResult;
use crate::pipeline::context::{Dependency, RunContext, StepInput, Trigger};
use crate::pipeline::contract::{self, Contract};

/// Input contract of a step, assembled from the run context
pub trait StepInputs: Sized + Send {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self>;
}

impl StepInputs for Trigger {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(input.trigger().clone())
    }
}

/// Trait for workflow steps
#[async_trait]
pub trait Step: Send + Sync + 'static {
    /// Typed input gathered before execution
    type Input: StepInputs;

    /// Typed output recorded after execution
    type Output: Contract;

    /// Unique id, also the key of the step's output in the run context
    fn id(&self) -> &'static str;

    /// Human-readable name used in logs and error messages
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Upstream outputs this step reads
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Run the step
    async fn execute(&self, input: Self::Input) -> HypoflowResult<Self::Output>;
}

/// Object-safe form of [`Step`] used by the workflow executor
#[async_trait]
pub(crate) trait DynStep: Send + Sync {
    fn step_id(&self) -> &'static str;

    fn step_name(&self) -> &'static str;

    fn step_description(&self) -> &'static str;

    fn declared_dependencies(&self) -> Vec<Dependency>;

    /// Gather input, execute, and encode the validated output
    async fn run(&self, context: &RunContext, dependencies: &[Dependency]) -> HypoflowResult<Value>;
}

#[async_trait]
impl<S: Step> DynStep for S {
    fn step_id(&self) -> &'static str {
        Step::id(self)
    }

    fn step_name(&self) -> &'static str {
        Step::name(self)
    }

    fn step_description(&self) -> &'static str {
        Step::description(self)
    }

    fn declared_dependencies(&self) -> Vec<Dependency> {
        Step::dependencies(self)
    }

    async fn run(&self, context: &RunContext, dependencies: &[Dependency]) -> HypoflowResult<Value> {
        let input = StepInput::new(Step::id(self), context, dependencies);
        let gathered = S::Input::gather(&input)?;
        let output = self.execute(gathered).await?;
        contract::encode(&output)
    }
}
