//! Fusion and ranking
//!
//! Scores every catalog candidate against a query on the enabled channels,
//! fuses the channel similarities with the caller's weights and returns the
//! candidates ranked by total score.

use crate::config::MatcherConfig;
use crate::error::Result;
use crate::features::{Channel, FeatureBundle};
use crate::scoring::{ChannelScore, ChannelScorer, ChannelStatus, PreparedBundle};
use crate::weights::WeightConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};


/// Comparison of the query against one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: String,
    /// Weighted sum of channel similarities
    pub total_score: f64,
    /// One entry per enabled channel, in canonical channel order
    pub channel_scores: Vec<ChannelScore>,
}

impl MatchResult {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelScore> {
        self.channel_scores.iter().find(|s| s.channel == channel)
    }

    /// Similarity of `channel`, 0 when the channel was not enabled
    pub fn similarity(&self, channel: Channel) -> f64 {
        self.channel(channel).map(|s| s.similarity).unwrap_or(0.0)
    }

    /// True when no enabled channel produced a score
    pub fn has_signal(&self) -> bool {
        self.channel_scores
            .iter()
            .any(|s| s.status == ChannelStatus::Scored)
    }
}

/// Candidates ordered by total score, descending.
///
/// Equal scores keep their catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedMatches {
    matches: Vec<MatchResult>,
    top_k: usize,
}

impl RankedMatches {
    fn rank(mut matches: Vec<MatchResult>, top_k: usize) -> Self {
        // Vec::sort_by is stable
        matches.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        Self { matches, top_k }
    }

    /// Full ranking
    pub fn all(&self) -> &[MatchResult] {
        &self.matches
    }

    /// First `top_k` entries of the ranking
    pub fn top(&self) -> &[MatchResult] {
        &self.matches[..self.top_k.min(self.matches.len())]
    }

    pub fn best(&self) -> Option<&MatchResult> {
        self.matches.first()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn into_vec(self) -> Vec<MatchResult> {
        self.matches
    }
}

/// Query-by-humming matcher.
///
/// Holds only immutable calibration, so one instance can serve concurrent
/// callers.
#[derive(Debug)]
pub struct Matcher {
    scorer: ChannelScorer,
    parallel_threshold: usize,
}

impl Matcher {
    pub fn new(config: &MatcherConfig) -> Result<Self> {
        config.calibration.validate()?;
        Ok(Self {
            scorer: ChannelScorer::new(config.calibration.clone()),
            parallel_threshold: config.parallel_threshold,
        })
    }

    /// Build around an existing scorer (e.g. one with a custom DTW primitive)
    pub fn with_scorer(scorer: ChannelScorer, parallel_threshold: usize) -> Self {
        Self {
            scorer,
            parallel_threshold,
        }
    }

    pub fn scorer(&self) -> &ChannelScorer {
        &self.scorer
    }

    /// Rank `candidates` against `query`.
    ///
    /// An empty catalog yields an empty ranking. Candidates without usable
    /// signal stay in the ranking with a score of 0.
    pub fn compare(
        &self,
        query: &FeatureBundle,
        candidates: &[(String, FeatureBundle)],
        weights: &WeightConfig,
        top_k: usize,
    ) -> Result<RankedMatches> {
        weights.validate()?;

        if candidates.is_empty() {
            log::info!("Empty catalog, nothing to rank");
            return Ok(RankedMatches::rank(Vec::new(), top_k));
        }

        let start = std::time::Instant::now();
        let prepared_query = self.scorer.prepare(query);
        log::debug!(
            "Query: {} voiced frames, {} intervals",
            prepared_query.voiced_frames(),
            prepared_query.intervals().len()
        );

        let score_one = |(id, bundle): &(String, FeatureBundle)| {
            let prepared = self.scorer.prepare(bundle);
            self.fuse(id.clone(), &prepared_query, &prepared, weights)
        };

        let results: Vec<MatchResult> = if candidates.len() >= self.parallel_threshold {
            candidates.par_iter().map(score_one).collect()
        } else {
            candidates.iter().map(score_one).collect()
        };

        let ranked = RankedMatches::rank(results, top_k);

        log::info!(
            "Ranked {} candidates in {:.3}s",
            ranked.len(),
            start.elapsed().as_secs_f64()
        );
        if let Some(best) = ranked.best() {
            log::info!("Best match: {} ({:.2})", best.candidate_id, best.total_score);
        }

        Ok(ranked)
    }

    /// Score a single pair. The result's `candidate_id` is empty.
    pub fn score(
        &self,
        query: &FeatureBundle,
        candidate: &FeatureBundle,
        weights: &WeightConfig,
    ) -> Result<MatchResult> {
        weights.validate()?;
        let a = self.scorer.prepare(query);
        let b = self.scorer.prepare(candidate);
        Ok(self.fuse(String::new(), &a, &b, weights))
    }

    fn fuse(
        &self,
        candidate_id: String,
        query: &PreparedBundle,
        candidate: &PreparedBundle,
        weights: &WeightConfig,
    ) -> MatchResult {
        let channel_scores: Vec<ChannelScore> = weights
            .channels()
            .map(|channel| self.scorer.score_channel(channel, query, candidate))
            .collect();

        let total_score = weights
            .iter()
            .zip(&channel_scores)
            .map(|((_, weight), score)| weight * score.similarity)
            .sum();

        log::debug!(
            "{}: total {:.2} [{}]",
            candidate_id,
            total_score,
            channel_scores
                .iter()
                .map(|s| format!("{} {:.1}", s.channel, s.similarity))
                .collect::<Vec<_>>()
                .join(", ")
        );

        MatchResult {
            candidate_id,
            total_score,
            channel_scores,
        }
    }
}
