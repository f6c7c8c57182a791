// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! End-to-end runs of the research workflow against scripted services

use std::sync::Arc;

use hypoflow::generation::{AgentRole, ResearchFindings, StubGeneration, StubResearch};
use hypoflow::research::steps::{
    ADDITIONAL_RESEARCH, ENHANCED_LITERATURE_REVIEW, GENERATE_FINAL_REPORT,
};
use hypoflow::research::testing::ScriptedReplies;
use hypoflow::{research_workflow, run_research, HypoflowError, ResearchOptions, Trigger};

const GOAL: &str = "Identify repurposable drugs that slow ALS progression";

fn findings() -> ResearchFindings {
    ResearchFindings {
        content: "Riluzole and edaravone show modest benefit.".into(),
        citations: vec!["https://example.org/als-review".into()],
    }
}

struct Harness {
    generation: Arc<StubGeneration>,
    research: Arc<StubResearch>,
}

impl Harness {
    fn new(replies: ScriptedReplies, research: StubResearch) -> Self {
        Self {
            generation: Arc::new(replies.into_stub()),
            research: Arc::new(research),
        }
    }

    fn workflow(&self) -> hypoflow::Workflow {
        research_workflow(
            self.generation.clone(),
            self.research.clone(),
            ResearchOptions::default(),
        )
        .unwrap()
    }
}

#[tokio::test]
async fn test_report_covers_goal_and_debated_hypotheses() {
    let harness = Harness::new(ScriptedReplies::default(), StubResearch::new(findings()));
    let workflow = harness.workflow();

    let result = workflow
        .run(Trigger::new(GOAL).with_preferences("testable in mice"))
        .await
        .unwrap();

    assert!(result.was_skipped(ADDITIONAL_RESEARCH));
    assert_eq!(result.executed().len(), 9);

    let report: hypoflow::FinalReport = result.output(GENERATE_FINAL_REPORT).unwrap();
    assert!(report.final_report.starts_with("REPORT"));
    assert!(report.final_report.contains(GOAL));
    assert!(report.final_report.contains("Debated hypothesis"));
    assert!(!report.final_report.contains("Additional Research Findings"));

    // Only the literature review searched
    assert_eq!(harness.research.calls(), 1);
}

#[tokio::test]
async fn test_call_counts_follow_the_tournament() {
    let harness = Harness::new(ScriptedReplies::default(), StubResearch::new(findings()));
    run_research(&harness.workflow(), Trigger::new(GOAL))
        .await
        .unwrap();

    let generation = &harness.generation;
    assert_eq!(generation.calls_for(AgentRole::Supervisor), 1);
    assert_eq!(generation.calls_for(AgentRole::LiteratureGeneration), 1);
    assert_eq!(generation.calls_for(AgentRole::Reflection), 3);
    // Three candidates play three matches
    assert_eq!(generation.calls_for(AgentRole::Ranking), 3);
    // Verdict "1" everywhere leaves A and B as distinct winners
    assert_eq!(generation.calls_for(AgentRole::EvolutionFeasibility), 2);
    assert_eq!(generation.calls_for(AgentRole::EvolutionOutOfTheBox), 2);
    assert_eq!(generation.calls_for(AgentRole::DebateGeneration), 2);
    assert_eq!(generation.calls_for(AgentRole::MetaReview), 1);
    // The report only
    assert_eq!(generation.calls_for(AgentRole::Worker), 1);
}

#[tokio::test]
async fn test_insufficient_evidence_triggers_additional_research() {
    let replies = ScriptedReplies::default()
        .with_meta_review("There is insufficient evidence for the top hypotheses.");
    let harness = Harness::new(replies, StubResearch::new(findings()));

    let report = run_research(&harness.workflow(), Trigger::new(GOAL))
        .await
        .unwrap();

    assert!(report.final_report.contains("Enhanced hypothesis"));
    assert!(report.final_report.contains("Additional Research Findings"));
    assert!(report.final_report.contains("insufficient evidence"));

    assert_eq!(harness.research.calls(), 2);
    let queries = harness.research.queries();
    assert!(queries.iter().all(|(query, _)| query == GOAL));

    // Two enhancements plus the report
    assert_eq!(harness.generation.calls_for(AgentRole::Worker), 3);
}

#[tokio::test]
async fn test_research_failure_names_the_literature_step() {
    let harness = Harness::new(
        ScriptedReplies::default(),
        StubResearch::failing("rate limited"),
    );

    let err = harness
        .workflow()
        .run(Trigger::new(GOAL))
        .await
        .unwrap_err();

    match &err {
        HypoflowError::StepFailed { step_id, .. } => {
            assert_eq!(step_id, ENHANCED_LITERATURE_REVIEW)
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(err.root_cause(), HypoflowError::Research { .. }));
    assert!(err.to_string().contains("rate limited"));

    // Nothing after the failed step ran
    assert_eq!(harness.generation.calls_for(AgentRole::LiteratureGeneration), 0);
}

#[tokio::test]
async fn test_blank_goal_is_rejected_before_any_call() {
    let harness = Harness::new(ScriptedReplies::default(), StubResearch::new(findings()));

    let err = harness.workflow().run(Trigger::new("   ")).await.unwrap_err();

    assert!(matches!(err, HypoflowError::InvalidTrigger { .. }));
    assert!(harness.generation.requests().is_empty());
    assert_eq!(harness.research.calls(), 0);
}
