// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Workflow engine
//!
//! This module defines the generic engine: typed steps, the run context they
//! share, gating conditions, in-step fan-out, and the sequential executor.

mod builder;
mod condition;
mod context;
pub mod contract;
mod dag;
mod executor;
pub mod fanout;
mod step;

pub use builder::{StepPlan, Workflow, WorkflowBuilder};
pub use condition::{first_marker, Condition};
pub use context::{Dependency, RunContext, StepInput, Trigger};
pub use contract::Contract;
pub use dag::{DagBuilder, EdgeKind};
pub use executor::{NoopObserver, RunObserver, RunResult, StepRecord, StepStatus};
pub use step::{Step, StepInputs};
