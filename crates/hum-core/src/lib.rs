//! Hum Core - Query-by-Humming Matching Engine
//!
//! Ranks a catalog of songs against a hummed query by melodic similarity.
//! Pitch contours are reduced to key- and tempo-invariant interval and
//! contour sequences, aligned with dynamic time warping alongside MFCC and
//! chroma frames, and the per-channel similarities are fused with caller
//! supplied weights.

pub mod align;
pub mod config;
pub mod contour;
pub mod error;
pub mod features;
pub mod matching;
pub mod numeric;
pub mod pitch;
pub mod scoring;
pub mod weights;

pub use align::{Alignment, ClassicDtw, DtwPrimitive, SequenceAligner};
pub use config::{CalibrationConfig, CalibrationPoint, MatcherConfig};
pub use contour::ContourEncoder;
pub use error::{MatchError, Result};
pub use features::{Channel, FeatureBundle, FeatureMatrix};
pub use matching::{MatchResult, Matcher, RankedMatches};
pub use pitch::{PitchNormalizer, PitchRepresentation};
pub use scoring::{ChannelScore, ChannelScorer, ChannelStatus};
pub use weights::{Profile, WeightConfig};

/// Rank `candidates` against `query` with the default calibration
pub fn compare(
    query: &FeatureBundle,
    candidates: &[(String, FeatureBundle)],
    weights: &WeightConfig,
    top_k: usize,
) -> Result<RankedMatches> {
    Matcher::new(&MatcherConfig::default())?.compare(query, candidates, weights, top_k)
}

/// Score one pair with the default calibration
pub fn score(
    query: &FeatureBundle,
    candidate: &FeatureBundle,
    weights: &WeightConfig,
) -> Result<MatchResult> {
    Matcher::new(&MatcherConfig::default())?.score(query, candidate, weights)
}
