// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Workflow definition
//!
//! Workflows are assembled with a fluent builder and become immutable once
//! committed. Committing validates the dependency graph.

use crate::errors::{HypoflowError, HypoflowResult};
use crate::pipeline::condition::Condition;
use crate::pipeline::context::Dependency;
use crate::pipeline::dag::DagBuilder;
use crate::pipeline::step::{DynStep, Step};

/// A step together with its scheduling metadata
pub(crate) struct StepEntry {
    pub(crate) step: Box<dyn DynStep>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) condition: Option<Condition>,
}

/// Static description of a scheduled step
#[derive(Debug, Clone)]
pub struct StepPlan {
    /// Step id
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Step description
    pub description: &'static str,
    /// Declared upstream outputs
    pub dependencies: Vec<Dependency>,
    /// Gate label and the outputs it reads, for gated steps
    pub gate: Option<(String, Vec<Dependency>)>,
}

impl StepPlan {
    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }
}

/// Fluent builder for a [`Workflow`]
pub struct WorkflowBuilder {
    name: String,
    description: Option<String>,
    entries: Vec<StepEntry>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            entries: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a step
    pub fn then<S: Step>(self, step: S) -> Self {
        self.push(step, None)
    }

    /// Append a step that runs only when `condition` holds
    pub fn then_when<S: Step>(self, step: S, condition: Condition) -> Self {
        self.push(step, Some(condition))
    }

    fn push<S: Step>(mut self, step: S, condition: Option<Condition>) -> Self {
        let dependencies = step.declared_dependencies();
        self.entries.push(StepEntry {
            step: Box::new(step),
            dependencies,
            condition,
        });
        self
    }

    /// Validate the graph and freeze the workflow
    pub fn commit(self) -> HypoflowResult<Workflow> {
        if self.entries.is_empty() {
            return Err(HypoflowError::EmptyWorkflow {
                workflow: self.name,
            });
        }

        let plans: Vec<StepPlan> = self.entries.iter().map(plan_for).collect();
        let dag = DagBuilder::build(&plans)?;

        Ok(Workflow {
            name: self.name,
            description: self.description,
            entries: self.entries,
            plans,
            dag,
        })
    }
}

fn plan_for(entry: &StepEntry) -> StepPlan {
    StepPlan {
        id: entry.step.step_id(),
        name: entry.step.step_name(),
        description: entry.step.step_description(),
        dependencies: entry.dependencies.clone(),
        gate: entry
            .condition
            .as_ref()
            .map(|c| (c.label().to_string(), c.reads().to_vec())),
    }
}

/// A committed, immutable workflow
pub struct Workflow {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) entries: Vec<StepEntry>,
    pub(crate) plans: Vec<StepPlan>,
    pub(crate) dag: DagBuilder,
}

impl Workflow {
    /// Start building a workflow
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Step plans in execution order
    pub fn plans(&self) -> &[StepPlan] {
        &self.plans
    }

    /// Step ids in execution order
    pub fn step_ids(&self) -> Vec<&'static str> {
        self.plans.iter().map(|p| p.id).collect()
    }

    /// Dependency graph of the workflow
    pub fn dag(&self) -> &DagBuilder {
        &self.dag
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("steps", &self.step_ids())
            .finish()
    }
}
