//! JSON output formatting

use hum_core::{Channel, ChannelStatus, MatchResult, RankedMatches};
use hum_store::{Catalog, FeatureStats};
use serde::Serialize;

/// One ranked song as reported to the user
#[derive(Debug, Serialize)]
pub struct MatchEntry {
    pub rank: usize,
    pub song_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub similarity: f64,
    pub pitch_score: Option<f64>,
    pub contour_score: Option<f64>,
    pub mfcc_score: Option<f64>,
    pub chroma_score: Option<f64>,
    /// Channels that fell back to 0 and why
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

impl MatchEntry {
    pub fn new(rank: usize, result: &MatchResult, catalog: Option<&Catalog>) -> Self {
        let file = catalog.and_then(|c| c.get(&result.candidate_id)).map(|e| &e.file);
        let channel_score = |channel| result.channel(channel).map(|s| round2(s.similarity));
        Self {
            rank,
            song_id: result.candidate_id.clone(),
            title: file.and_then(|f| f.metadata.title.clone()),
            artist: file.and_then(|f| f.metadata.artist.clone()),
            similarity: round2(result.total_score),
            pitch_score: channel_score(Channel::Pitch),
            contour_score: channel_score(Channel::Contour),
            mfcc_score: channel_score(Channel::Mfcc),
            chroma_score: channel_score(Channel::Chroma),
            degraded: result
                .channel_scores
                .iter()
                .filter(|s| s.status != ChannelStatus::Scored)
                .map(|s| format!("{}: {:?}", s.channel, s.status))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct RankingOutput {
    query_path: String,
    candidates: usize,
    best_match: Option<MatchEntry>,
    top_matches: Vec<MatchEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_matches: Option<Vec<MatchEntry>>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print a ranking with its best match and top-K prefix
pub fn print_ranking(
    query_path: &str,
    ranked: &RankedMatches,
    catalog: Option<&Catalog>,
    include_all: bool,
) {
    let entries = |results: &[MatchResult]| -> Vec<MatchEntry> {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| MatchEntry::new(i + 1, r, catalog))
            .collect()
    };

    let output = RankingOutput {
        query_path: query_path.to_string(),
        candidates: ranked.len(),
        best_match: ranked.best().map(|r| MatchEntry::new(1, r, catalog)),
        top_matches: entries(ranked.top()),
        all_matches: include_all.then(|| entries(ranked.all())),
    };

    print_json(&output);
}

/// Print a single pair comparison
pub fn print_match_result(result: &MatchResult) {
    print_json(result);
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    path: String,
    stats: &'a FeatureStats,
    warnings: Vec<String>,
}

/// Print diagnostics for one feature file
pub fn print_stats(path: &str, stats: &FeatureStats) {
    print_json(&StatsOutput {
        path: path.to_string(),
        stats,
        warnings: stats.warnings(),
    });
}
