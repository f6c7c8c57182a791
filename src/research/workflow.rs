// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! The co-scientist research workflow

use std::sync::Arc;

use super::model::FinalReport;
use super::steps::*;
use crate::config::Settings;
use crate::errors::HypoflowResult;
use crate::generation::{GenerationService, ResearchService, SearchOptions};
use crate::pipeline::{Trigger, Workflow};
use crate::tournament::Tournament;

pub const WORKFLOW_NAME: &str = "co-scientist";

/// Tunables of the research workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResearchOptions {
    pub tournament: Tournament,
    pub search: SearchOptions,
}

impl ResearchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tournament: settings.ranking,
            search: SearchOptions {
                streaming: settings.research.streaming,
            },
        }
    }
}

/// Assemble the research workflow around the given services
pub fn research_workflow(
    generation: Arc<dyn GenerationService>,
    research: Arc<dyn ResearchService>,
    options: ResearchOptions,
) -> HypoflowResult<Workflow> {
    Workflow::builder(WORKFLOW_NAME)
        .description("Generate, review, rank, evolve and debate hypotheses for a research goal")
        .then(InitializeResearchGoal::new(generation.clone()))
        .then(EnhancedLiteratureReview::new(research.clone(), options.search))
        .then(GenerateInitialHypotheses::new(generation.clone()))
        .then(ReflectionAndReview::new(generation.clone()))
        .then(RankHypotheses::new(generation.clone(), options.tournament))
        .then(EvolveTopHypotheses::new(generation.clone()))
        .then(ScientificDebate::new(generation.clone()))
        .then(MetaReviewStep::new(generation.clone()))
        .then_when(
            AdditionalResearchStep::new(generation.clone(), research, options.search),
            needs_additional_research(),
        )
        .then(GenerateFinalReport::new(generation))
        .commit()
}

/// Run the workflow and return its final report
pub async fn run_research(workflow: &Workflow, trigger: Trigger) -> HypoflowResult<FinalReport> {
    let result = workflow.run(trigger).await?;
    result.output(GENERATE_FINAL_REPORT)
}
