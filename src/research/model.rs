// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Research data model
//!
//! Step outputs and structured generation replies. All payloads serialize
//! with camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::pipeline::contract::{unit_interval, Contract};

/// A candidate scientific hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub title: String,
    pub description: String,
    pub evidence: Vec<String>,
    /// Within [0, 1]
    pub confidence: f64,
    /// Within [0, 1]
    pub testability: f64,
    /// Within [0, 1]
    pub novelty: f64,
}

impl Hypothesis {
    fn check(&self) -> Result<(), String> {
        unit_interval("confidence", self.confidence)?;
        unit_interval("testability", self.testability)?;
        unit_interval("novelty", self.novelty)
    }

    fn json_schema() -> Value {
        let score = json!({ "type": "number", "minimum": 0, "maximum": 1 });
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "description": { "type": "string" },
                "evidence": { "type": "array", "items": { "type": "string" } },
                "confidence": score,
                "testability": score,
                "novelty": score
            },
            "required": ["title", "description", "evidence", "confidence", "testability", "novelty"]
        })
    }
}

impl Contract for Hypothesis {
    const NAME: &'static str = "hypothesis";

    fn schema() -> Value {
        Self::json_schema()
    }

    fn validate(&self) -> Result<(), String> {
        self.check()
            .map_err(|e| format!("hypothesis '{}': {}", self.title, e))
    }
}

fn check_all(hypotheses: &[Hypothesis]) -> Result<(), String> {
    for (i, hypothesis) in hypotheses.iter().enumerate() {
        hypothesis
            .check()
            .map_err(|e| format!("hypothesis {} ('{}'): {}", i + 1, hypothesis.title, e))?;
    }
    Ok(())
}

/// Object schema with one required property
fn wrapped(field: &str, schema: Value) -> Value {
    json!({
        "type": "object",
        "properties": { field: schema },
        "required": [field]
    })
}

fn list_of(schema: Value) -> Value {
    json!({ "type": "array", "items": schema })
}

// ─────────────────────────────────────────────────────────────────────────────
// Step outputs
// ─────────────────────────────────────────────────────────────────────────────

/// Research plan drafted by the supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    #[serde(default)]
    pub research_plan: Value,
}

impl Contract for ResearchPlan {
    const NAME: &'static str = "research_plan";

    fn schema() -> Value {
        wrapped("researchPlan", json!({}))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteratureEntry {
    pub content: String,
    pub source: String,
    pub relevance_score: f64,
}

/// Literature gathered for the research goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteratureReview {
    pub relevant_literature: Vec<LiteratureEntry>,
}

impl Contract for LiteratureReview {
    const NAME: &'static str = "literature_review";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisBatch {
    pub hypotheses: Vec<Hypothesis>,
}

impl Contract for HypothesisBatch {
    const NAME: &'static str = "hypotheses";

    fn schema() -> Value {
        wrapped("hypotheses", list_of(Hypothesis::json_schema()))
    }

    fn validate(&self) -> Result<(), String> {
        check_all(&self.hypotheses)
    }
}

/// A hypothesis with its critical review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedHypothesis {
    pub hypothesis: Hypothesis,
    pub review: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedHypotheses {
    pub reviewed_hypotheses: Vec<ReviewedHypothesis>,
}

impl Contract for ReviewedHypotheses {
    const NAME: &'static str = "reviewed_hypotheses";

    fn validate(&self) -> Result<(), String> {
        self.reviewed_hypotheses
            .iter()
            .try_for_each(|r| r.hypothesis.validate())
    }
}

/// Tournament survivors, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedHypotheses {
    pub ranked_hypotheses: Vec<ReviewedHypothesis>,
}

impl Contract for RankedHypotheses {
    const NAME: &'static str = "ranked_hypotheses";

    fn validate(&self) -> Result<(), String> {
        for (i, candidate) in self.ranked_hypotheses.iter().enumerate() {
            if self.ranked_hypotheses[..i].contains(candidate) {
                return Err(format!(
                    "'{}' appears more than once",
                    candidate.hypothesis.title
                ));
            }
            candidate.hypothesis.validate()?;
        }
        Ok(())
    }
}

/// An original hypothesis and its two refinements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolvedHypothesis {
    pub original_hypothesis: Hypothesis,
    pub feasibility_evolution: Hypothesis,
    pub ootb_evolution: Hypothesis,
}

impl EvolvedHypothesis {
    /// Original, feasibility and out-of-the-box variants, in that order
    pub fn variants(&self) -> [&Hypothesis; 3] {
        [
            &self.original_hypothesis,
            &self.feasibility_evolution,
            &self.ootb_evolution,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolvedHypotheses {
    pub evolved_hypotheses: Vec<EvolvedHypothesis>,
}

impl Contract for EvolvedHypotheses {
    const NAME: &'static str = "evolved_hypotheses";

    fn validate(&self) -> Result<(), String> {
        self.evolved_hypotheses
            .iter()
            .flat_map(|e| e.variants())
            .try_for_each(|h| h.validate())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebatedHypotheses {
    pub debated_hypotheses: Vec<Hypothesis>,
}

impl Contract for DebatedHypotheses {
    const NAME: &'static str = "debated_hypotheses";

    fn validate(&self) -> Result<(), String> {
        check_all(&self.debated_hypotheses)
    }
}

/// Synthesis of all reviews plus the hypotheses carried forward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReview {
    pub meta_review: String,
    pub final_hypotheses: Vec<Hypothesis>,
}

impl Contract for MetaReview {
    const NAME: &'static str = "meta_review";

    fn validate(&self) -> Result<(), String> {
        check_all(&self.final_hypotheses)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalResearch {
    pub additional_findings: String,
    pub enhanced_hypotheses: Vec<Hypothesis>,
}

impl Contract for AdditionalResearch {
    const NAME: &'static str = "additional_research";

    fn validate(&self) -> Result<(), String> {
        check_all(&self.enhanced_hypotheses)
    }
}

/// Result of a research workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub final_report: String,
}

impl Contract for FinalReport {
    const NAME: &'static str = "final_report";
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation replies
// ─────────────────────────────────────────────────────────────────────────────

/// Critical review of one hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review: String,
    pub score: f64,
}

impl Contract for Review {
    const NAME: &'static str = "review";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "review": { "type": "string" },
                "score": { "type": "number" }
            },
            "required": ["review", "score"]
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.score.is_finite() {
            Ok(())
        } else {
            Err("score must be a finite number".into())
        }
    }
}

/// Winner of a pairwise comparison, `"1"` or `"2"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingVerdict {
    pub better_idea: String,
}

impl Contract for RankingVerdict {
    const NAME: &'static str = "ranking_verdict";

    fn schema() -> Value {
        wrapped("betterIdea", json!({ "type": "string", "enum": ["1", "2"] }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evolution {
    pub evolved_hypothesis: Hypothesis,
}

impl Contract for Evolution {
    const NAME: &'static str = "evolution";

    fn schema() -> Value {
        wrapped("evolvedHypothesis", Hypothesis::json_schema())
    }

    fn validate(&self) -> Result<(), String> {
        self.evolved_hypothesis.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateOutcome {
    pub final_hypothesis: Hypothesis,
}

impl Contract for DebateOutcome {
    const NAME: &'static str = "debate_outcome";

    fn schema() -> Value {
        wrapped("finalHypothesis", Hypothesis::json_schema())
    }

    fn validate(&self) -> Result<(), String> {
        self.final_hypothesis.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReviewText {
    pub meta_review: String,
}

impl Contract for MetaReviewText {
    const NAME: &'static str = "meta_review_text";

    fn schema() -> Value {
        wrapped("metaReview", json!({ "type": "string" }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enhancement {
    pub enhanced_hypothesis: Hypothesis,
}

impl Contract for Enhancement {
    const NAME: &'static str = "enhancement";

    fn schema() -> Value {
        wrapped("enhancedHypothesis", Hypothesis::json_schema())
    }

    fn validate(&self) -> Result<(), String> {
        self.enhanced_hypothesis.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportText {
    pub report: String,
}

impl Contract for ReportText {
    const NAME: &'static str = "report_text";

    fn schema() -> Value {
        wrapped("report", json!({ "type": "string" }))
    }
}
