// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Research workflow steps
//!
//! Each step gathers a typed input from the outputs it declares, makes its
//! generation or research calls, and returns a typed output. Independent
//! calls within a step fan out concurrently and are joined before the step
//! returns.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::model::*;
use super::prompts;
use crate::errors::HypoflowResult;
use crate::generation::{
    generate_as, AgentRole, GenerationService, ResearchService, SearchOptions,
};
use crate::pipeline::fanout::fan_out;
use crate::pipeline::{first_marker, Condition, Dependency, Step, StepInput, StepInputs, Trigger};
use crate::tournament::{Side, Tournament};

pub const INITIALIZE_RESEARCH_GOAL: &str = "initializeResearchGoal";
pub const ENHANCED_LITERATURE_REVIEW: &str = "enhancedLiteratureReview";
pub const GENERATE_INITIAL_HYPOTHESES: &str = "generateInitialHypotheses";
pub const REFLECTION_AND_REVIEW: &str = "reflectionAndReview";
pub const RANK_HYPOTHESES: &str = "rankHypotheses";
pub const EVOLVE_TOP_HYPOTHESES: &str = "evolveTopHypotheses";
pub const SCIENTIFIC_DEBATE: &str = "scientificDebate";
pub const META_REVIEW: &str = "metaReview";
pub const ADDITIONAL_RESEARCH: &str = "additionalResearch";
pub const GENERATE_FINAL_REPORT: &str = "generateFinalReport";

/// How many top-ranked hypotheses are evolved
pub const EVOLUTION_TOP_K: usize = 3;

/// Source label of the literature entry produced by deep research
pub const DEEP_RESEARCH_SOURCE: &str = "Deep Research Tool";

/// Meta-review phrases that trigger additional research (case-sensitive)
pub const INSUFFICIENCY_MARKERS: &[&str] = &["additional research", "insufficient evidence"];

fn meta_review_text(review: &MetaReview) -> &str {
    &review.meta_review
}

/// Gate for the additional research step
pub fn needs_additional_research() -> Condition {
    Condition::output_contains_any::<MetaReview>(
        "meta-review asks for more evidence",
        META_REVIEW,
        meta_review_text,
        INSUFFICIENCY_MARKERS,
    )
}

type Generator = Arc<dyn GenerationService>;
type Researcher = Arc<dyn ResearchService>;

// ─────────────────────────────────────────────────────────────────────────────
// 1. Research plan
// ─────────────────────────────────────────────────────────────────────────────

pub struct InitializeResearchGoal {
    generation: Generator,
}

impl InitializeResearchGoal {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

#[async_trait]
impl Step for InitializeResearchGoal {
    type Input = Trigger;
    type Output = ResearchPlan;

    fn id(&self) -> &'static str {
        INITIALIZE_RESEARCH_GOAL
    }

    fn name(&self) -> &'static str {
        "Initialize Research Goal"
    }

    fn description(&self) -> &'static str {
        "Parse the research goal and draft a research plan"
    }

    async fn execute(&self, trigger: Trigger) -> HypoflowResult<ResearchPlan> {
        info!(goal = %trigger.goal, "Initializing research goal");

        let plan: ResearchPlan = generate_as(
            &*self.generation,
            AgentRole::Supervisor,
            prompts::research_plan(&trigger),
        )
        .await?;

        info!(plan_size = plan.research_plan.to_string().len(), "Research plan drafted");
        Ok(plan)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 2. Literature review
// ─────────────────────────────────────────────────────────────────────────────

pub struct EnhancedLiteratureReview {
    research: Researcher,
    options: SearchOptions,
}

impl EnhancedLiteratureReview {
    pub fn new(research: Researcher, options: SearchOptions) -> Self {
        Self { research, options }
    }
}

#[async_trait]
impl Step for EnhancedLiteratureReview {
    type Input = Trigger;
    type Output = LiteratureReview;

    fn id(&self) -> &'static str {
        ENHANCED_LITERATURE_REVIEW
    }

    fn name(&self) -> &'static str {
        "Enhanced Literature Review"
    }

    fn description(&self) -> &'static str {
        "Search the literature for context relevant to the goal"
    }

    async fn execute(&self, trigger: Trigger) -> HypoflowResult<LiteratureReview> {
        info!(goal = %trigger.goal, "Performing literature review");

        let findings = self.research.search(&trigger.goal, self.options).await?;
        let relevant_literature = vec![LiteratureEntry {
            content: findings.content,
            source: DEEP_RESEARCH_SOURCE.to_string(),
            relevance_score: 1.0,
        }];

        info!(result_count = relevant_literature.len(), "Literature review completed");
        Ok(LiteratureReview {
            relevant_literature,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 3. Initial hypotheses
// ─────────────────────────────────────────────────────────────────────────────

pub struct GenerateInitialHypotheses {
    generation: Generator,
}

impl GenerateInitialHypotheses {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

pub struct PlanAndLiterature {
    trigger: Trigger,
    plan: ResearchPlan,
    literature: LiteratureReview,
}

impl StepInputs for PlanAndLiterature {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            plan: input.required(INITIALIZE_RESEARCH_GOAL)?,
            literature: input.required(ENHANCED_LITERATURE_REVIEW)?,
        })
    }
}

#[async_trait]
impl Step for GenerateInitialHypotheses {
    type Input = PlanAndLiterature;
    type Output = HypothesisBatch;

    fn id(&self) -> &'static str {
        GENERATE_INITIAL_HYPOTHESES
    }

    fn name(&self) -> &'static str {
        "Generate Initial Hypotheses"
    }

    fn description(&self) -> &'static str {
        "Generate initial hypotheses from the plan and literature"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::Required(INITIALIZE_RESEARCH_GOAL),
            Dependency::Required(ENHANCED_LITERATURE_REVIEW),
        ]
    }

    async fn execute(&self, input: PlanAndLiterature) -> HypoflowResult<HypothesisBatch> {
        info!(goal = %input.trigger.goal, "Generating initial hypotheses");

        let batch: HypothesisBatch = generate_as(
            &*self.generation,
            AgentRole::LiteratureGeneration,
            prompts::initial_hypotheses(
                &input.trigger,
                &input.plan,
                &input.literature.relevant_literature,
            ),
        )
        .await?;

        info!(hypothesis_count = batch.hypotheses.len(), "Generated initial hypotheses");
        Ok(batch)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 4. Reflection
// ─────────────────────────────────────────────────────────────────────────────

pub struct ReflectionAndReview {
    generation: Generator,
}

impl ReflectionAndReview {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

impl StepInputs for HypothesisBatch {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        input.required(GENERATE_INITIAL_HYPOTHESES)
    }
}

#[async_trait]
impl Step for ReflectionAndReview {
    type Input = HypothesisBatch;
    type Output = ReviewedHypotheses;

    fn id(&self) -> &'static str {
        REFLECTION_AND_REVIEW
    }

    fn name(&self) -> &'static str {
        "Reflection and Review"
    }

    fn description(&self) -> &'static str {
        "Review each hypothesis for correctness, quality and novelty"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::Required(GENERATE_INITIAL_HYPOTHESES)]
    }

    async fn execute(&self, batch: HypothesisBatch) -> HypoflowResult<ReviewedHypotheses> {
        info!(hypothesis_count = batch.hypotheses.len(), "Starting reflection and review");

        let generation = &*self.generation;
        let reviewed_hypotheses = fan_out(batch.hypotheses, |hypothesis| async move {
            let review: Review =
                generate_as(generation, AgentRole::Reflection, prompts::review(&hypothesis))
                    .await?;
            Ok(ReviewedHypothesis {
                hypothesis,
                review: review.review,
                score: review.score,
            })
        })
        .await?;

        info!(review_count = reviewed_hypotheses.len(), "Completed reflection and review");
        Ok(ReviewedHypotheses {
            reviewed_hypotheses,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 5. Tournament ranking
// ─────────────────────────────────────────────────────────────────────────────

pub struct RankHypotheses {
    generation: Generator,
    tournament: Tournament,
}

impl RankHypotheses {
    pub fn new(generation: Generator, tournament: Tournament) -> Self {
        Self {
            generation,
            tournament,
        }
    }
}

pub struct ReviewsForRanking {
    trigger: Trigger,
    reviewed: ReviewedHypotheses,
}

impl StepInputs for ReviewsForRanking {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            reviewed: input.required(REFLECTION_AND_REVIEW)?,
        })
    }
}

#[async_trait]
impl Step for RankHypotheses {
    type Input = ReviewsForRanking;
    type Output = RankedHypotheses;

    fn id(&self) -> &'static str {
        RANK_HYPOTHESES
    }

    fn name(&self) -> &'static str {
        "Rank Hypotheses"
    }

    fn description(&self) -> &'static str {
        "Rank hypotheses with a pairwise tournament"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::Required(REFLECTION_AND_REVIEW)]
    }

    async fn execute(&self, input: ReviewsForRanking) -> HypoflowResult<RankedHypotheses> {
        let candidates = input.reviewed.reviewed_hypotheses;
        info!(hypothesis_count = candidates.len(), "Starting hypothesis ranking");

        let generation = &*self.generation;
        let trigger = &input.trigger;
        let ranked_hypotheses = self
            .tournament
            .rank(candidates, |matchup| async move {
                let verdict: RankingVerdict = generate_as(
                    generation,
                    AgentRole::Ranking,
                    prompts::ranking(trigger, &matchup),
                )
                .await?;
                Side::from_verdict(&verdict.better_idea)
            })
            .await?;

        info!(ranked_count = ranked_hypotheses.len(), "Completed hypothesis ranking");
        Ok(RankedHypotheses { ranked_hypotheses })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 6. Evolution
// ─────────────────────────────────────────────────────────────────────────────

pub struct EvolveTopHypotheses {
    generation: Generator,
}

impl EvolveTopHypotheses {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

pub struct RankingForEvolution {
    trigger: Trigger,
    ranked: RankedHypotheses,
}

impl StepInputs for RankingForEvolution {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            ranked: input.required(RANK_HYPOTHESES)?,
        })
    }
}

#[async_trait]
impl Step for EvolveTopHypotheses {
    type Input = RankingForEvolution;
    type Output = EvolvedHypotheses;

    fn id(&self) -> &'static str {
        EVOLVE_TOP_HYPOTHESES
    }

    fn name(&self) -> &'static str {
        "Evolve Top Hypotheses"
    }

    fn description(&self) -> &'static str {
        "Refine the top-ranked hypotheses for feasibility and originality"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::Required(RANK_HYPOTHESES)]
    }

    async fn execute(&self, input: RankingForEvolution) -> HypoflowResult<EvolvedHypotheses> {
        let mut top = input.ranked.ranked_hypotheses;
        top.truncate(EVOLUTION_TOP_K);
        info!(top_hypothesis_count = top.len(), "Starting hypothesis evolution");

        let generation = &*self.generation;
        let trigger = &input.trigger;
        let evolved_hypotheses = fan_out(top, |ranked| async move {
            let prompt = prompts::evolution(trigger, &ranked.hypothesis);
            let (feasibility, ootb) = tokio::try_join!(
                generate_as::<Evolution>(generation, AgentRole::EvolutionFeasibility, prompt.as_str()),
                generate_as::<Evolution>(generation, AgentRole::EvolutionOutOfTheBox, prompt.as_str()),
            )?;
            Ok(EvolvedHypothesis {
                original_hypothesis: ranked.hypothesis,
                feasibility_evolution: feasibility.evolved_hypothesis,
                ootb_evolution: ootb.evolved_hypothesis,
            })
        })
        .await?;

        info!(evolved_count = evolved_hypotheses.len(), "Completed hypothesis evolution");
        Ok(EvolvedHypotheses { evolved_hypotheses })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 7. Debate
// ─────────────────────────────────────────────────────────────────────────────

pub struct ScientificDebate {
    generation: Generator,
}

impl ScientificDebate {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

pub struct EvolutionForDebate {
    trigger: Trigger,
    evolved: EvolvedHypotheses,
}

impl StepInputs for EvolutionForDebate {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            evolved: input.required(EVOLVE_TOP_HYPOTHESES)?,
        })
    }
}

#[async_trait]
impl Step for ScientificDebate {
    type Input = EvolutionForDebate;
    type Output = DebatedHypotheses;

    fn id(&self) -> &'static str {
        SCIENTIFIC_DEBATE
    }

    fn name(&self) -> &'static str {
        "Scientific Debate"
    }

    fn description(&self) -> &'static str {
        "Debate each evolved hypothesis into a single refined version"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::Required(EVOLVE_TOP_HYPOTHESES)]
    }

    async fn execute(&self, input: EvolutionForDebate) -> HypoflowResult<DebatedHypotheses> {
        let evolved = input.evolved.evolved_hypotheses;
        info!(hypothesis_count = evolved.len(), "Starting scientific debate");

        let generation = &*self.generation;
        let trigger = &input.trigger;
        let debated_hypotheses = fan_out(evolved, |record| async move {
            let outcome: DebateOutcome = generate_as(
                generation,
                AgentRole::DebateGeneration,
                prompts::debate(trigger, &record.variants()),
            )
            .await?;
            Ok(outcome.final_hypothesis)
        })
        .await?;

        info!(debated_count = debated_hypotheses.len(), "Completed scientific debate");
        Ok(DebatedHypotheses { debated_hypotheses })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 8. Meta-review
// ─────────────────────────────────────────────────────────────────────────────

pub struct MetaReviewStep {
    generation: Generator,
}

impl MetaReviewStep {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

pub struct ReviewsAndDebate {
    trigger: Trigger,
    reviewed: ReviewedHypotheses,
    debated: DebatedHypotheses,
}

impl StepInputs for ReviewsAndDebate {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            reviewed: input.required(REFLECTION_AND_REVIEW)?,
            debated: input.required(SCIENTIFIC_DEBATE)?,
        })
    }
}

#[async_trait]
impl Step for MetaReviewStep {
    type Input = ReviewsAndDebate;
    type Output = MetaReview;

    fn id(&self) -> &'static str {
        META_REVIEW
    }

    fn name(&self) -> &'static str {
        "Meta-Review"
    }

    fn description(&self) -> &'static str {
        "Synthesise recurring critiques across all reviews"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::Required(REFLECTION_AND_REVIEW),
            Dependency::Required(SCIENTIFIC_DEBATE),
        ]
    }

    async fn execute(&self, input: ReviewsAndDebate) -> HypoflowResult<MetaReview> {
        info!(
            review_count = input.reviewed.reviewed_hypotheses.len(),
            debated_count = input.debated.debated_hypotheses.len(),
            "Starting meta-review"
        );

        let text: MetaReviewText = generate_as(
            &*self.generation,
            AgentRole::MetaReview,
            prompts::meta_review(&input.trigger, &input.reviewed.reviewed_hypotheses),
        )
        .await?;

        info!("Completed meta-review");
        Ok(MetaReview {
            meta_review: text.meta_review,
            final_hypotheses: input.debated.debated_hypotheses,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 9. Additional research (gated)
// ─────────────────────────────────────────────────────────────────────────────

pub struct AdditionalResearchStep {
    generation: Generator,
    research: Researcher,
    options: SearchOptions,
}

impl AdditionalResearchStep {
    pub fn new(generation: Generator, research: Researcher, options: SearchOptions) -> Self {
        Self {
            generation,
            research,
            options,
        }
    }
}

pub struct MetaReviewInput {
    trigger: Trigger,
    meta_review: MetaReview,
}

impl StepInputs for MetaReviewInput {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            meta_review: input.required(META_REVIEW)?,
        })
    }
}

#[async_trait]
impl Step for AdditionalResearchStep {
    type Input = MetaReviewInput;
    type Output = AdditionalResearch;

    fn id(&self) -> &'static str {
        ADDITIONAL_RESEARCH
    }

    fn name(&self) -> &'static str {
        "Additional Research"
    }

    fn description(&self) -> &'static str {
        "Gather more evidence when the meta-review finds it lacking"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::Required(META_REVIEW)]
    }

    async fn execute(&self, input: MetaReviewInput) -> HypoflowResult<AdditionalResearch> {
        let MetaReviewInput {
            trigger,
            meta_review,
        } = input;
        info!(
            reason = first_marker(&meta_review.meta_review, INSUFFICIENCY_MARKERS).unwrap_or("unspecified"),
            "Starting additional research"
        );

        let findings = self.research.search(&trigger.goal, self.options).await?;
        let literature = findings.with_citations();

        let generation = &*self.generation;
        let literature = literature.as_str();
        let enhanced_hypotheses = fan_out(meta_review.final_hypotheses, |hypothesis| async move {
            let enhancement: Enhancement = generate_as(
                generation,
                AgentRole::Worker,
                prompts::enhancement(&hypothesis, literature),
            )
            .await?;
            Ok(enhancement.enhanced_hypothesis)
        })
        .await?;

        info!(enhanced_count = enhanced_hypotheses.len(), "Completed additional research");
        Ok(AdditionalResearch {
            additional_findings: prompts::additional_findings(&meta_review.meta_review),
            enhanced_hypotheses,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 10. Final report
// ─────────────────────────────────────────────────────────────────────────────

pub struct GenerateFinalReport {
    generation: Generator,
}

impl GenerateFinalReport {
    pub fn new(generation: Generator) -> Self {
        Self { generation }
    }
}

pub struct ReportInput {
    trigger: Trigger,
    meta_review: MetaReview,
    additional: Option<AdditionalResearch>,
}

impl ReportInput {
    /// Enhanced hypotheses when additional research ran, otherwise the meta-review's
    fn hypotheses(&self) -> &[Hypothesis] {
        match &self.additional {
            Some(additional) => &additional.enhanced_hypotheses,
            None => &self.meta_review.final_hypotheses,
        }
    }
}

impl StepInputs for ReportInput {
    fn gather(input: &StepInput<'_>) -> HypoflowResult<Self> {
        Ok(Self {
            trigger: input.trigger().clone(),
            meta_review: input.required(META_REVIEW)?,
            additional: input.optional(ADDITIONAL_RESEARCH)?,
        })
    }
}

#[async_trait]
impl Step for GenerateFinalReport {
    type Input = ReportInput;
    type Output = FinalReport;

    fn id(&self) -> &'static str {
        GENERATE_FINAL_REPORT
    }

    fn name(&self) -> &'static str {
        "Generate Final Report"
    }

    fn description(&self) -> &'static str {
        "Compile the final research report"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::Required(META_REVIEW),
            Dependency::Optional(ADDITIONAL_RESEARCH),
        ]
    }

    async fn execute(&self, input: ReportInput) -> HypoflowResult<FinalReport> {
        let hypotheses = input.hypotheses();
        info!(
            hypothesis_count = hypotheses.len(),
            additional_research_performed = input.additional.is_some(),
            "Generating final report"
        );

        let prompt = prompts::final_report(
            &input.trigger,
            hypotheses,
            &input.meta_review.meta_review,
            input
                .additional
                .as_ref()
                .map(|a| a.additional_findings.as_str()),
        );
        let report: ReportText =
            generate_as(&*self.generation, AgentRole::Worker, prompt).await?;

        info!(report_length = report.report.len(), "Final report generated");
        Ok(FinalReport {
            final_report: report.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HypoflowError;
    use crate::generation::{
        Generation, GenerationRequest, ResearchFindings, StubGeneration, StubResearch,
    };
    use crate::research::testing::{hypothesis, ScriptedReplies};
    use serde_json::json;

    fn scripted() -> Arc<StubGeneration> {
        Arc::new(ScriptedReplies::default().into_stub())
    }

    fn reviewed(title: &str) -> ReviewedHypothesis {
        ReviewedHypothesis {
            hypothesis: hypothesis(title),
            review: format!("review of {}", title),
            score: 5.0,
        }
    }

    #[test]
    fn test_gate_markers_are_case_sensitive() {
        assert_eq!(
            first_marker("we need additional research here", INSUFFICIENCY_MARKERS),
            Some("additional research")
        );
        assert_eq!(
            first_marker("There is insufficient evidence.", INSUFFICIENCY_MARKERS),
            Some("insufficient evidence")
        );
        assert_eq!(first_marker("Additional Research advised", INSUFFICIENCY_MARKERS), None);
    }

    #[tokio::test]
    async fn test_literature_review_wraps_findings() {
        let research = Arc::new(StubResearch::new(ResearchFindings {
            content: "deep findings".into(),
            citations: vec!["https://a.example".into()],
        }));
        let step = EnhancedLiteratureReview::new(research.clone(), SearchOptions::default());

        let review = step.execute(Trigger::new("goal")).await.unwrap();
        assert_eq!(
            review.relevant_literature,
            vec![LiteratureEntry {
                content: "deep findings".into(),
                source: DEEP_RESEARCH_SOURCE.into(),
                relevance_score: 1.0,
            }]
        );
        assert_eq!(research.queries(), vec![("goal".to_string(), SearchOptions::default())]);
    }

    #[tokio::test]
    async fn test_reflection_preserves_order() {
        let generation = scripted();
        let step = ReflectionAndReview::new(generation.clone());

        let reviewed = step
            .execute(HypothesisBatch {
                hypotheses: vec![hypothesis("a"), hypothesis("b"), hypothesis("c")],
            })
            .await
            .unwrap();

        let titles: Vec<_> = reviewed
            .reviewed_hypotheses
            .iter()
            .map(|r| r.hypothesis.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(generation.calls_for(AgentRole::Reflection), 3);
    }

    #[tokio::test]
    async fn test_ranking_plays_every_pair() {
        let generation = scripted();
        let step = RankHypotheses::new(generation.clone(), Tournament::default());

        let ranked = step
            .execute(ReviewsForRanking {
                trigger: Trigger::new("goal"),
                reviewed: ReviewedHypotheses {
                    reviewed_hypotheses: vec![reviewed("A"), reviewed("B"), reviewed("C"), reviewed("D")],
                },
            })
            .await
            .unwrap();

        assert_eq!(generation.calls_for(AgentRole::Ranking), 6);
        let titles: Vec<_> = ranked
            .ranked_hypotheses
            .iter()
            .map(|r| r.hypothesis.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_ranking_rejects_malformed_verdict() {
        let generation = Arc::new(StubGeneration::new(|_| {
            Ok(Generation::Structured(json!({ "betterIdea": "both" })))
        }));
        let step = RankHypotheses::new(generation, Tournament::default());

        let err = step
            .execute(ReviewsForRanking {
                trigger: Trigger::new("goal"),
                reviewed: ReviewedHypotheses {
                    reviewed_hypotheses: vec![reviewed("A"), reviewed("B")],
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HypoflowError::InvalidVerdict { ref verdict } if verdict == "both"));
    }

    #[tokio::test]
    async fn test_evolution_takes_top_three() {
        let generation = scripted();
        let step = EvolveTopHypotheses::new(generation.clone());

        let ranked: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|t| reviewed(t)).collect();
        let evolved = step
            .execute(RankingForEvolution {
                trigger: Trigger::new("goal"),
                ranked: RankedHypotheses {
                    ranked_hypotheses: ranked,
                },
            })
            .await
            .unwrap();

        let originals: Vec<_> = evolved
            .evolved_hypotheses
            .iter()
            .map(|e| e.original_hypothesis.title.as_str())
            .collect();
        assert_eq!(originals, vec!["A", "B", "C"]);
        assert_eq!(generation.calls_for(AgentRole::EvolutionFeasibility), 3);
        assert_eq!(generation.calls_for(AgentRole::EvolutionOutOfTheBox), 3);
    }

    #[tokio::test]
    async fn test_evolution_with_fewer_candidates() {
        let generation = scripted();
        let step = EvolveTopHypotheses::new(generation.clone());

        let evolved = step
            .execute(RankingForEvolution {
                trigger: Trigger::new("goal"),
                ranked: RankedHypotheses {
                    ranked_hypotheses: vec![reviewed("only")],
                },
            })
            .await
            .unwrap();
        assert_eq!(evolved.evolved_hypotheses.len(), 1);
    }

    #[tokio::test]
    async fn test_one_failed_enhancement_fails_the_step() {
        let generation = Arc::new(StubGeneration::new(|request: &GenerationRequest| {
            if request.prompt.contains("\"title\":\"bad\"") {
                Err(HypoflowError::generation("worker", "rate limited"))
            } else {
                Ok(Generation::Structured(json!({
                    "enhancedHypothesis": hypothesis("better")
                })))
            }
        }));
        let research = Arc::new(StubResearch::new(ResearchFindings::default()));
        let step = AdditionalResearchStep::new(generation, research, SearchOptions::default());

        let err = step
            .execute(MetaReviewInput {
                trigger: Trigger::new("goal"),
                meta_review: MetaReview {
                    meta_review: "insufficient evidence".into(),
                    final_hypotheses: vec![hypothesis("good"), hypothesis("bad")],
                },
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_additional_research_quotes_meta_review() {
        let generation = scripted();
        let research = Arc::new(StubResearch::new(ResearchFindings {
            content: "more".into(),
            citations: vec!["https://c.example".into()],
        }));
        let step = AdditionalResearchStep::new(generation.clone(), research, SearchOptions::default());

        let output = step
            .execute(MetaReviewInput {
                trigger: Trigger::new("goal"),
                meta_review: MetaReview {
                    meta_review: "needs additional research".into(),
                    final_hypotheses: vec![hypothesis("x"), hypothesis("y")],
                },
            })
            .await
            .unwrap();

        assert_eq!(
            output.additional_findings,
            "Additional research was conducted based on the meta-review suggestion: \"needs additional research\""
        );
        assert_eq!(output.enhanced_hypotheses.len(), 2);

        let prompts: Vec<_> = generation.requests().into_iter().map(|r| r.prompt).collect();
        assert!(prompts.iter().all(|p| p.contains("more\n\n[1] https://c.example")));
    }

    #[test]
    fn test_report_selects_hypotheses() {
        let meta_review = MetaReview {
            meta_review: "fine".into(),
            final_hypotheses: vec![hypothesis("debated")],
        };
        let without = ReportInput {
            trigger: Trigger::new("g"),
            meta_review: meta_review.clone(),
            additional: None,
        };
        assert_eq!(without.hypotheses()[0].title, "debated");

        let with = ReportInput {
            trigger: Trigger::new("g"),
            meta_review,
            additional: Some(AdditionalResearch {
                additional_findings: "f".into(),
                enhanced_hypotheses: vec![hypothesis("enhanced")],
            }),
        };
        assert_eq!(with.hypotheses()[0].title, "enhanced");
    }
}
