// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Pairwise tournament ranking
//!
//! Every distinct pair of candidates is judged once, all matches
//! concurrently. Winners are folded into a deduplicated list in order of
//! first appearance. There is no aggregate score and no tie-break, so a
//! candidate that never wins is dropped.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{HypoflowError, HypoflowResult};
use crate::pipeline::fanout::{fan_out, fan_out_settled};

/// Order in which match winners are folded into the ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionOrder {
    /// Order in which matches were generated (deterministic)
    #[default]
    MatchOrder,
    /// Order in which judgements settle
    Completion,
}

/// What to do with a single candidate, which yields no matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingletonPolicy {
    /// The lone candidate is returned unranked
    #[default]
    PassThrough,
    /// The ranking is empty
    Drop,
}

/// Side of a match chosen by the judge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// Parse a verdict of exactly `"1"` or `"2"`, ignoring surrounding whitespace
    pub fn from_verdict(verdict: &str) -> HypoflowResult<Self> {
        match verdict.trim() {
            "1" => Ok(Self::First),
            "2" => Ok(Self::Second),
            other => Err(HypoflowError::InvalidVerdict {
                verdict: other.to_string(),
            }),
        }
    }
}

/// An unordered pair of candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match<T> {
    pub hypothesis1: T,
    pub hypothesis2: T,
}

impl<T> Match<T> {
    /// The candidate on the given side
    pub fn side(&self, side: Side) -> &T {
        match side {
            Side::First => &self.hypothesis1,
            Side::Second => &self.hypothesis2,
        }
    }
}

/// A judged match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<T> {
    #[serde(rename = "match")]
    pub matchup: Match<T>,
    pub winner: T,
}

/// One match per distinct pair `(i, j)` with `i < j`, in index order
pub fn build_matches<T: Clone>(candidates: &[T]) -> Vec<Match<T>> {
    let mut matches = Vec::with_capacity(candidates.len() * candidates.len().saturating_sub(1) / 2);
    for (i, first) in candidates.iter().enumerate() {
        for second in &candidates[i + 1..] {
            matches.push(Match {
                hypothesis1: first.clone(),
                hypothesis2: second.clone(),
            });
        }
    }
    matches
}

/// Fold winners into a list without structurally-equal duplicates
pub fn reduce_winners<T: PartialEq>(results: impl IntoIterator<Item = MatchResult<T>>) -> Vec<T> {
    let mut ranked: Vec<T> = Vec::new();
    for result in results {
        if !ranked.contains(&result.winner) {
            ranked.push(result.winner);
        }
    }
    ranked
}

/// Tournament settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tournament {
    pub reduction: ReductionOrder,
    pub singleton: SingletonPolicy,
}

impl Tournament {
    /// Judge every match concurrently
    ///
    /// Results follow the configured reduction order. The first failing
    /// judgement fails the whole tournament.
    pub async fn play<T, F, Fut>(
        &self,
        matches: Vec<Match<T>>,
        mut judge: F,
    ) -> HypoflowResult<Vec<MatchResult<T>>>
    where
        T: Clone,
        F: FnMut(Match<T>) -> Fut,
        Fut: Future<Output = HypoflowResult<Side>>,
    {
        let unit = |matchup: Match<T>| {
            let verdict = judge(matchup.clone());
            async move {
                let side = verdict.await?;
                let winner = matchup.side(side).clone();
                Ok(MatchResult { matchup, winner })
            }
        };

        match self.reduction {
            ReductionOrder::MatchOrder => fan_out(matches, unit).await,
            ReductionOrder::Completion => fan_out_settled(matches, unit).await,
        }
    }

    /// Rank candidates by pairwise comparison
    pub async fn rank<T, F, Fut>(&self, candidates: Vec<T>, judge: F) -> HypoflowResult<Vec<T>>
    where
        T: Clone + PartialEq,
        F: FnMut(Match<T>) -> Fut,
        Fut: Future<Output = HypoflowResult<Side>>,
    {
        if candidates.len() == 1 {
            debug!(policy = ?self.singleton, "Single candidate, no matches to play");
            return Ok(match self.singleton {
                SingletonPolicy::PassThrough => candidates,
                SingletonPolicy::Drop => Vec::new(),
            });
        }

        let matches = build_matches(&candidates);
        info!(
            candidates = candidates.len(),
            match_count = matches.len(),
            "Created tournament matches"
        );

        let results = self.play(matches, judge).await?;
        let ranked = reduce_winners(results);

        info!(ranked_count = ranked.len(), "Tournament complete");
        Ok(ranked)
    }
}
