// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Prompt payloads for each research stage

use serde::Serialize;

use super::model::{Hypothesis, LiteratureEntry, ResearchPlan, ReviewedHypothesis};
use crate::pipeline::Trigger;
use crate::tournament::Match;

/// Compact JSON, or a placeholder if serialization fails
fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn preferences(trigger: &Trigger) -> &str {
    trigger.preferences.as_deref().unwrap_or("none specified")
}

pub fn research_plan(trigger: &Trigger) -> String {
    format!(
        "Goal: {}\n\nPreferences: {}",
        trigger.goal,
        preferences(trigger)
    )
}

/// `Source: …` / `Content: …` blocks separated by blank lines
pub fn format_literature(entries: &[LiteratureEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("Source: {}\nContent: {}", e.source, e.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn initial_hypotheses(
    trigger: &Trigger,
    plan: &ResearchPlan,
    literature: &[LiteratureEntry],
) -> String {
    format!(
        "Goal: {}\nPreferences: {}\nResearch Plan: {}\n\nArticles with Reasoning:\n{}",
        trigger.goal,
        preferences(trigger),
        to_json(&plan.research_plan),
        format_literature(literature)
    )
}

pub fn review(hypothesis: &Hypothesis) -> String {
    format!("Hypothesis: {}", to_json(hypothesis))
}

/// Pairwise comparison; reviews are included but their scores must not decide
pub fn ranking(trigger: &Trigger, matchup: &Match<ReviewedHypothesis>) -> String {
    format!(
        "Goal: {}\nPreferences: {}\n\n\
         Hypothesis 1: {}\nReview 1: {}\n\n\
         Hypothesis 2: {}\nReview 2: {}\n\n\
         Disregard any numeric scores in the reviews; they are not comparable. \
         Answer \"1\" or \"2\".",
        trigger.goal,
        preferences(trigger),
        to_json(&matchup.hypothesis1.hypothesis),
        matchup.hypothesis1.review,
        to_json(&matchup.hypothesis2.hypothesis),
        matchup.hypothesis2.review
    )
}

pub fn evolution(trigger: &Trigger, hypothesis: &Hypothesis) -> String {
    format!(
        "Goal: {}\nPreferences: {}\nHypothesis: {}",
        trigger.goal,
        preferences(trigger),
        to_json(hypothesis)
    )
}

pub fn debate(trigger: &Trigger, variants: &[&Hypothesis]) -> String {
    let variants = variants
        .iter()
        .map(|h| to_json(h))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Goal: {}\nPreferences: {}\nIdea Attributes: novel, testable, and scientifically sound\n\n\
         Initial hypotheses for debate:\n{}",
        trigger.goal,
        preferences(trigger),
        variants
    )
}

pub fn meta_review(trigger: &Trigger, reviews: &[ReviewedHypothesis]) -> String {
    let reviews = reviews
        .iter()
        .map(|r| r.review.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Goal: {}\nPreferences: {}\nReviews:\n{}",
        trigger.goal,
        preferences(trigger),
        reviews
    )
}

pub fn enhancement(hypothesis: &Hypothesis, literature: &str) -> String {
    format!(
        "Enhance this scientific hypothesis with additional research.\n\n\
         Hypothesis: {}\n\n\
         Additional Literature:\n{}\n\n\
         Provide an enhanced version of the hypothesis with stronger evidence and clearer testability.",
        to_json(hypothesis),
        literature
    )
}

/// Quote of the meta-review that prompted additional research
pub fn additional_findings(meta_review: &str) -> String {
    format!(
        "Additional research was conducted based on the meta-review suggestion: \"{}\"",
        meta_review
    )
}

/// Final report request with its seven fixed sections
pub fn final_report(
    trigger: &Trigger,
    hypotheses: &[Hypothesis],
    meta_review: &str,
    additional_findings: Option<&str>,
) -> String {
    let hypotheses = hypotheses
        .iter()
        .map(to_json)
        .collect::<Vec<_>>()
        .join("\n\n");
    let findings = additional_findings
        .map(|f| format!("\n\nAdditional Research Findings: {}", f))
        .unwrap_or_default();

    format!(
        "Generate a comprehensive research report for the goal: {goal}\n\n\
         Include the following sections:\n\
         1. Executive Summary\n\
         2. Research Goal and Context\n\
         3. Methodology\n\
         4. Top Hypotheses (include the following hypotheses: {hypotheses})\n\
         5. Meta-Review Insights: {meta_review}{findings}\n\
         6. Recommendations for Further Research\n\
         7. Conclusion\n\n\
         Format the report in a professional scientific style.",
        goal = trigger.goal,
    )
}
