// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Agent roles and their standing instructions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persona a generation request is made under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Supervisor,
    LiteratureGeneration,
    Reflection,
    Ranking,
    EvolutionFeasibility,
    EvolutionOutOfTheBox,
    DebateGeneration,
    MetaReview,
    Worker,
}

impl AgentRole {
    pub const ALL: [AgentRole; 9] = [
        Self::Supervisor,
        Self::LiteratureGeneration,
        Self::Reflection,
        Self::Ranking,
        Self::EvolutionFeasibility,
        Self::EvolutionOutOfTheBox,
        Self::DebateGeneration,
        Self::MetaReview,
        Self::Worker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::LiteratureGeneration => "literature_generation",
            Self::Reflection => "reflection",
            Self::Ranking => "ranking",
            Self::EvolutionFeasibility => "evolution_feasibility",
            Self::EvolutionOutOfTheBox => "evolution_out_of_the_box",
            Self::DebateGeneration => "debate_generation",
            Self::MetaReview => "meta_review",
            Self::Worker => "worker",
        }
    }

    /// System instructions sent with every request in this role
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::Supervisor => SUPERVISOR,
            Self::LiteratureGeneration => LITERATURE_GENERATION,
            Self::Reflection => REFLECTION,
            Self::Ranking => RANKING,
            Self::EvolutionFeasibility => EVOLUTION_FEASIBILITY,
            Self::EvolutionOutOfTheBox => EVOLUTION_OUT_OF_THE_BOX,
            Self::DebateGeneration => DEBATE_GENERATION,
            Self::MetaReview => META_REVIEW,
            Self::Worker => WORKER,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const SUPERVISOR: &str = "\
You coordinate a team of research agents. Read the research goal and the \
evaluation preferences, then lay out a research plan: the questions to answer, \
the literature to consult, the kinds of hypotheses worth generating, and the \
criteria they will be judged by. Return the plan as structured data.";

const LITERATURE_GENERATION: &str = "\
You are a domain expert formulating a novel, well-founded hypothesis for the \
stated goal. You have reviewed the literature provided and built a reasoning \
framework from it. Describe each hypothesis in detail for an expert audience: \
name the specific entities and mechanisms involved and the outcomes you \
expect. Cite the evidence that supports it and rate its confidence, \
testability and novelty between 0 and 1.";

const REFLECTION: &str = "\
You are a critical scientific reviewer. Assess the hypothesis for correctness, \
quality, novelty and testability. Point out unsupported assumptions and \
missing controls. Write a concise review and give an overall score.";

const RANKING: &str = "\
You simulate a panel of unbiased domain experts comparing two competing \
hypotheses, only one of which can be pursued. Summarise both with their \
reviews, question anything ambiguous, and weigh each against the goal and \
criteria: likely validity, practical utility, specificity, novelty and \
desirability. The reviews may contain numeric scores; ignore them, since \
scores from different reviews are not comparable. End with a judgement \
naming the better hypothesis as \"1\" or \"2\".";

const EVOLUTION_FEASIBILITY: &str = "\
You are an expert in research methodology and technical feasibility. Refine \
the given hypothesis so it can be implemented with current technology while \
keeping it novel, coherent and specific. Ground the refinement in recent \
work and established methods, and favour simple, practical designs.";

const EVOLUTION_OUT_OF_THE_BOX: &str = "\
You are a researcher generating one original hypothesis inspired by the \
concept provided. Draw on analogies rather than copying it, and avoid merely \
combining existing methods. Think out of the box, but keep the result \
detailed and specific enough to test.";

const DEBATE_GENERATION: &str = "\
You take part in a simulated discussion among experts whose aim is a novel, \
testable and scientifically sound hypothesis. Critically compare the variants \
provided, ask about anything unclear, identify weaknesses and propose \
concrete improvements. Conclude with a single refined, self-contained \
hypothesis.";

const META_REVIEW: &str = "\
You are an expert in scientific meta-analysis. Synthesise the reviews \
provided into a structured meta-review for the research goal. Identify \
recurring critiques and common issues, and give actionable guidance for \
future proposals. Do not judge individual proposals. If the evidence behind \
the hypotheses is too thin, say that additional research is needed.";

const WORKER: &str = "\
You are an auxiliary worker supporting the research team. Interpret each \
request carefully and produce the best possible output in the requested \
format. Do not include disclaimers, warnings or conversational filler; the \
output is used in a professional research setting.";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_role_has_distinct_name_and_instructions() {
        let names: HashSet<_> = AgentRole::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), AgentRole::ALL.len());

        for role in AgentRole::ALL {
            assert!(!role.instructions().is_empty(), "{} has no instructions", role);
        }
    }

    #[test]
    fn test_ranking_ignores_numeric_scores() {
        assert!(AgentRole::Ranking.instructions().contains("ignore them"));
    }
}
