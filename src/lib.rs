// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! # hypoflow - Research Hypothesis Workflow Orchestrator
//!
//! `hypoflow` turns a research goal into a report on ranked, evolved and
//! debated hypotheses by chaining language-model agents and a deep-research
//! search service.
//!
//! ## Features
//!
//! - **Typed pipeline** - steps declare what they read, outputs are checked against contracts
//! - **Fan-out** - reviews and evolutions run concurrently per hypothesis
//! - **Tournament ranking** - pairwise comparisons reduced to an ordered list of winners
//! - **Conditional research** - extra evidence is gathered only when the meta-review asks for it
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default configuration
//! hypoflow init
//!
//! # Run the workflow
//! hypoflow run "Identify repurposable drugs for ALS" --preferences "testable in vitro"
//!
//! # Show the step graph
//! hypoflow graph --format mermaid
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod generation;
pub mod pipeline;
pub mod research;
pub mod tournament;
pub mod utils;

// Re-export commonly used types
pub use errors::{HypoflowError, HypoflowResult};
pub use pipeline::{Trigger, Workflow};
pub use research::{research_workflow, run_research, FinalReport, ResearchOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
