// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Research hypothesis workflow
//!
//! Turns a natural-language research goal into a ranked, evolved and
//! reported set of hypotheses:
//!
//! 1. draft a research plan and review the literature
//! 2. generate hypotheses and review each one
//! 3. rank them in a pairwise tournament, then evolve and debate the best
//! 4. meta-review, optionally gather more evidence, and write the report

pub mod model;
pub mod prompts;
pub mod steps;
pub mod testing;
mod workflow;

pub use model::{FinalReport, Hypothesis, MetaReview, ReviewedHypothesis};
pub use workflow::{research_workflow, run_research, ResearchOptions, WORKFLOW_NAME};
