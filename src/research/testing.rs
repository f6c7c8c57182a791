// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Scripted generation replies for exercising the research workflow offline

use serde_json::json;

use super::model::Hypothesis;
use crate::errors::{HypoflowError, HypoflowResult};
use crate::generation::{AgentRole, Generation, GenerationRequest, StubGeneration};

/// A well-formed hypothesis with mid-range scores
pub fn hypothesis(title: &str) -> Hypothesis {
    Hypothesis {
        title: title.to_string(),
        description: format!("{} explained", title),
        evidence: vec![format!("evidence for {}", title)],
        confidence: 0.7,
        testability: 0.6,
        novelty: 0.5,
    }
}

/// Valid replies for every contract the research steps request
///
/// The report reply echoes its prompt, so the goal and the hypotheses the
/// report was asked to cover appear in the final report.
#[derive(Debug, Clone)]
pub struct ScriptedReplies {
    pub hypotheses: Vec<Hypothesis>,
    pub meta_review: String,
    /// Ranking verdict, normally `"1"` or `"2"`
    pub verdict: String,
}

impl Default for ScriptedReplies {
    fn default() -> Self {
        Self {
            hypotheses: vec![
                hypothesis("Hypothesis A"),
                hypothesis("Hypothesis B"),
                hypothesis("Hypothesis C"),
            ],
            meta_review: "Reviewers consistently praised the mechanistic detail.".to_string(),
            verdict: "1".to_string(),
        }
    }
}

impl ScriptedReplies {
    pub fn with_meta_review(mut self, meta_review: impl Into<String>) -> Self {
        self.meta_review = meta_review.into();
        self
    }

    pub fn with_hypotheses(mut self, hypotheses: Vec<Hypothesis>) -> Self {
        self.hypotheses = hypotheses;
        self
    }

    /// Reply to a request, chosen by its output contract
    pub fn reply(&self, request: &GenerationRequest) -> HypoflowResult<Generation> {
        let contract = request.contract.as_ref().map_or("", |c| c.name);
        let value = match contract {
            "research_plan" => json!({
                "researchPlan": { "phases": ["survey", "hypothesise", "rank", "report"] }
            }),
            "hypotheses" => json!({ "hypotheses": self.hypotheses }),
            "review" => json!({
                "review": format!("Reviewed by the {} agent", request.role),
                "score": 7.5
            }),
            "ranking_verdict" => json!({ "betterIdea": self.verdict }),
            "evolution" => {
                let title = match request.role {
                    AgentRole::EvolutionFeasibility => "Feasible refinement",
                    _ => "Out-of-the-box refinement",
                };
                json!({ "evolvedHypothesis": hypothesis(title) })
            }
            "debate_outcome" => json!({ "finalHypothesis": hypothesis("Debated hypothesis") }),
            "meta_review_text" => json!({ "metaReview": self.meta_review }),
            "enhancement" => json!({ "enhancedHypothesis": hypothesis("Enhanced hypothesis") }),
            "report_text" => json!({ "report": format!("REPORT\n\n{}", request.prompt) }),
            other => {
                return Err(HypoflowError::generation(
                    request.role.name(),
                    format!("no scripted reply for contract '{}'", other),
                ))
            }
        };
        Ok(Generation::Structured(value))
    }

    pub fn into_stub(self) -> StubGeneration {
        StubGeneration::new(move |request| self.reply(request))
    }
}
