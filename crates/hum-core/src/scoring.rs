//! Per-channel similarity scorers
//!
//! Each scorer aligns two prepared sequences and maps the raw DTW distance to
//! a similarity in [0, 100] through a calibrated, non-increasing curve.
//! Scorers never fail: missing signal and alignment errors are logged and
//! reported as a zero similarity with a [`ChannelStatus`] explaining why.

use crate::align::{Alignment, SequenceAligner};
use crate::config::{CalibrationConfig, CalibrationPoint};
use crate::contour::ContourEncoder;
use crate::error::{MatchError, Result};
use crate::features::{Channel, FeatureBundle, FeatureMatrix};
use crate::numeric::clamp_similarity;
use crate::pitch::{PitchNormalizer, PitchRepresentation};
use serde::{Deserialize, Serialize};

/// Outcome of a single channel comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Scored,
    InsufficientData,
    AlignmentFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelScore {
    pub channel: Channel,
    /// Raw DTW distance, absent when the channel could not be aligned
    pub distance: Option<f64>,
    /// 0-100
    pub similarity: f64,
    pub status: ChannelStatus,
}

impl ChannelScore {
    fn scored(channel: Channel, distance: f64, similarity: f64) -> Self {
        Self {
            channel,
            distance: Some(distance),
            similarity: clamp_similarity(similarity),
            status: ChannelStatus::Scored,
        }
    }

    fn absorbed(channel: Channel, err: &MatchError) -> Self {
        let status = match err {
            MatchError::InsufficientData { .. } => {
                log::debug!("{} channel scored 0: {}", channel, err);
                ChannelStatus::InsufficientData
            }
            _ => {
                log::warn!("{} channel scored 0: {}", channel, err);
                ChannelStatus::AlignmentFailure
            }
        };
        Self {
            channel,
            distance: None,
            similarity: 0.0,
            status,
        }
    }
}

/// `100 * (1 - min(distance / scale, 1))`, clamped to [0, 100]
pub fn linear_similarity(normalized_distance: f64, scale: f64) -> f64 {
    clamp_similarity(100.0 * (1.0 - (normalized_distance / scale).min(1.0)))
}

/// Piecewise-linear interpolation through `curve`.
///
/// Distances before the first point take its similarity, distances past the
/// last point take the last similarity.
pub fn piecewise_similarity(normalized_distance: f64, curve: &[CalibrationPoint]) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    if normalized_distance <= first.distance {
        return clamp_similarity(first.similarity);
    }
    if normalized_distance >= last.distance {
        return clamp_similarity(last.similarity);
    }
    for pair in curve.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if normalized_distance <= hi.distance {
            let t = (normalized_distance - lo.distance) / (hi.distance - lo.distance);
            return clamp_similarity(lo.similarity + t * (hi.similarity - lo.similarity));
        }
    }
    clamp_similarity(last.similarity)
}

/// Derived sequences of one bundle, computed once and reused across candidates
#[derive(Debug, Clone)]
pub struct PreparedBundle {
    voiced_frames: usize,
    intervals: Vec<f64>,
    contour: Vec<f64>,
    mfcc: std::result::Result<Vec<Vec<f64>>, MatchError>,
    chroma: std::result::Result<Vec<Vec<f64>>, MatchError>,
}

impl PreparedBundle {
    pub fn intervals(&self) -> &[f64] {
        &self.intervals
    }

    pub fn contour(&self) -> &[f64] {
        &self.contour
    }

    pub fn voiced_frames(&self) -> usize {
        self.voiced_frames
    }
}

/// Channel scorer set sharing one calibration
#[derive(Debug)]
pub struct ChannelScorer {
    calibration: CalibrationConfig,
    normalizer: PitchNormalizer,
    encoder: ContourEncoder,
    aligner: SequenceAligner,
}

impl ChannelScorer {
    pub fn new(calibration: CalibrationConfig) -> Self {
        let aligner = SequenceAligner::new(&calibration);
        Self::with_aligner(calibration, aligner)
    }

    pub fn with_aligner(calibration: CalibrationConfig, aligner: SequenceAligner) -> Self {
        Self {
            normalizer: PitchNormalizer::new(&calibration),
            encoder: ContourEncoder::new(&calibration),
            aligner,
            calibration,
        }
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    pub fn normalizer(&self) -> &PitchNormalizer {
        &self.normalizer
    }

    pub fn prepare(&self, bundle: &FeatureBundle) -> PreparedBundle {
        let intervals = self.normalizer.relative_intervals(&bundle.pitch_contour);
        let contour = self.encoder.encode(&intervals);
        PreparedBundle {
            voiced_frames: bundle.voiced_pitch().len(),
            intervals,
            contour,
            mfcc: self.prepare_matrix(Channel::Mfcc, &bundle.mfcc),
            chroma: self.prepare_matrix(Channel::Chroma, &bundle.chroma),
        }
    }

    fn prepare_matrix(
        &self,
        channel: Channel,
        matrix: &FeatureMatrix,
    ) -> std::result::Result<Vec<Vec<f64>>, MatchError> {
        let required = self.calibration.min_matrix_frames;
        if matrix.num_coeffs() == 0 || matrix.num_frames() < required {
            return Err(MatchError::InsufficientData {
                channel,
                available: if matrix.num_coeffs() == 0 { 0 } else { matrix.num_frames() },
                required,
            });
        }
        matrix.frames().ok_or_else(|| {
            MatchError::AlignmentFailure(format!("{} matrix has rows of unequal length", channel))
        })
    }

    /// Score one channel between two prepared bundles
    pub fn score_channel(
        &self,
        channel: Channel,
        a: &PreparedBundle,
        b: &PreparedBundle,
    ) -> ChannelScore {
        let result = match channel {
            Channel::Pitch => self.pitch_interval_similarity(a, b),
            Channel::Contour => self.contour_similarity(a, b),
            Channel::Mfcc => self.timbre_similarity(a, b),
            Channel::Chroma => self.harmony_similarity(a, b),
        };
        match result {
            Ok(score) => score,
            Err(e) => ChannelScore::absorbed(channel, &e),
        }
    }

    fn pitch_interval_similarity(
        &self,
        a: &PreparedBundle,
        b: &PreparedBundle,
    ) -> Result<ChannelScore> {
        self.require_voiced(Channel::Pitch, a, b)?;
        let alignment = self.aligner.align_scalar(&a.intervals, &b.intervals)?;
        Ok(self.linear(Channel::Pitch, alignment, self.calibration.interval_scale))
    }

    fn contour_similarity(&self, a: &PreparedBundle, b: &PreparedBundle) -> Result<ChannelScore> {
        self.require_voiced(Channel::Contour, a, b)?;
        let alignment = self.aligner.align_scalar(&a.contour, &b.contour)?;
        Ok(self.linear(Channel::Contour, alignment, self.calibration.contour_scale))
    }

    fn timbre_similarity(&self, a: &PreparedBundle, b: &PreparedBundle) -> Result<ChannelScore> {
        let fa = a.mfcc.as_ref().map_err(Clone::clone)?;
        let fb = b.mfcc.as_ref().map_err(Clone::clone)?;
        let alignment = self.aligner.align_frames(fa, fb)?;
        let feature_count = fa.first().map(|f| f.len()).unwrap_or(1).max(1);
        let normalized = alignment.distance / (alignment.avg_len() * feature_count as f64);
        let similarity = piecewise_similarity(normalized, &self.calibration.mfcc_curve);
        log::trace!("mfcc: distance {:.3}, normalized {:.3}", alignment.distance, normalized);
        Ok(ChannelScore::scored(Channel::Mfcc, alignment.distance, similarity))
    }

    fn harmony_similarity(&self, a: &PreparedBundle, b: &PreparedBundle) -> Result<ChannelScore> {
        let fa = a.chroma.as_ref().map_err(Clone::clone)?;
        let fb = b.chroma.as_ref().map_err(Clone::clone)?;
        let alignment = self.aligner.align_frames(fa, fb)?;
        Ok(self.linear(Channel::Chroma, alignment, self.calibration.chroma_scale))
    }

    /// Compare two raw contours in any pitch representation.
    ///
    /// Intervals use the interval scale, the full-contour representations
    /// use the raw-pitch scale. Reported on the pitch channel.
    pub fn representation_similarity(
        &self,
        a: &[f64],
        b: &[f64],
        repr: PitchRepresentation,
    ) -> ChannelScore {
        let scale = match repr {
            PitchRepresentation::Intervals => self.calibration.interval_scale,
            PitchRepresentation::MedianRelative | PitchRepresentation::Absolute => {
                self.calibration.raw_pitch_scale
            }
        };
        let sa = self.normalizer.normalize(a, repr);
        let sb = self.normalizer.normalize(b, repr);
        if sa.is_empty() || sb.is_empty() {
            let err = MatchError::InsufficientData {
                channel: Channel::Pitch,
                available: crate::features::voiced_frames(a)
                    .len()
                    .min(crate::features::voiced_frames(b).len()),
                required: self.normalizer.min_voiced_frames(),
            };
            return ChannelScore::absorbed(Channel::Pitch, &err);
        }
        match self.aligner.align_scalar(&sa, &sb) {
            Ok(alignment) => self.linear(Channel::Pitch, alignment, scale),
            Err(e) => ChannelScore::absorbed(Channel::Pitch, &e),
        }
    }

    fn require_voiced(
        &self,
        channel: Channel,
        a: &PreparedBundle,
        b: &PreparedBundle,
    ) -> Result<()> {
        if a.intervals.is_empty() || b.intervals.is_empty() {
            return Err(MatchError::InsufficientData {
                channel,
                available: a.voiced_frames.min(b.voiced_frames),
                required: self.normalizer.min_voiced_frames(),
            });
        }
        Ok(())
    }

    fn linear(&self, channel: Channel, alignment: Alignment, scale: f64) -> ChannelScore {
        let normalized = alignment.distance / alignment.avg_len();
        let similarity = linear_similarity(normalized, scale);
        log::trace!(
            "{}: distance {:.3}, normalized {:.3}, similarity {:.1}",
            channel,
            alignment.distance,
            normalized,
            similarity
        );
        ChannelScore::scored(channel, alignment.distance, similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalibrationConfig;
    use approx::assert_relative_eq;

    fn scorer() -> ChannelScorer {
        ChannelScorer::new(CalibrationConfig::default())
    }

    fn matrix(coeffs: usize, frames: usize, f: impl Fn(usize, usize) -> f64) -> FeatureMatrix {
        FeatureMatrix::new(
            (0..coeffs)
                .map(|c| (0..frames).map(|t| f(c, t)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_linear_similarity() {
        assert_relative_eq!(linear_similarity(0.0, 2.0), 100.0);
        assert_relative_eq!(linear_similarity(1.0, 2.0), 50.0);
        assert_relative_eq!(linear_similarity(5.0, 2.0), 0.0);
    }

    #[test]
    fn test_larger_scale_never_lowers_similarity() {
        for distance in [0.0, 0.3, 1.0, 1.7, 2.5, 10.0] {
            let mut prev = 0.0;
            for scale in [0.5, 1.2, 1.5, 2.0, 3.0, 5.0] {
                let s = linear_similarity(distance, scale);
                assert!(s >= prev, "distance {} scale {}", distance, scale);
                prev = s;
            }
        }
    }

    #[test]
    fn test_piecewise_curve() {
        let curve = CalibrationConfig::default().mfcc_curve;
        assert_relative_eq!(piecewise_similarity(0.0, &curve), 100.0);
        assert_relative_eq!(piecewise_similarity(6.0, &curve), 100.0);
        assert_relative_eq!(piecewise_similarity(6.25, &curve), 90.0);
        assert_relative_eq!(piecewise_similarity(6.75, &curve), 65.0);
        assert_relative_eq!(piecewise_similarity(7.5, &curve), 20.0);
        assert_relative_eq!(piecewise_similarity(7.75, &curve), 10.0);
        assert_relative_eq!(piecewise_similarity(9.0, &curve), 0.0);
    }

    #[test]
    fn test_piecewise_is_non_increasing() {
        let curve = CalibrationConfig::default().mfcc_curve;
        let mut prev = 100.0;
        for i in 0..200 {
            let s = piecewise_similarity(i as f64 * 0.05, &curve);
            assert!(s <= prev);
            prev = s;
        }
    }

    #[test]
    fn test_key_invariance_scenario() {
        let s = scorer();
        let query = [220.0, 220.0, 0.0, 247.0, 247.0, 262.0];
        let candidate = [440.0, 440.0, 0.0, 494.0, 494.0, 523.0];

        let intervals = s.prepare(&FeatureBundle::from_pitch(query.to_vec()));
        let other = s.prepare(&FeatureBundle::from_pitch(candidate.to_vec()));
        let relative = s.score_channel(Channel::Pitch, &intervals, &other);
        assert_eq!(relative.status, ChannelStatus::Scored);
        assert!(relative.similarity >= 90.0, "got {}", relative.similarity);

        let absolute =
            s.representation_similarity(&query, &candidate, PitchRepresentation::Absolute);
        assert_eq!(absolute.status, ChannelStatus::Scored);
        assert!(absolute.similarity < relative.similarity - 50.0);
    }

    #[test]
    fn test_silent_bundle_scores_zero() {
        let s = scorer();
        let silent = s.prepare(&FeatureBundle::from_pitch(vec![0.0; 100]));
        let sung = s.prepare(&FeatureBundle::from_pitch(
            (0..100).map(|i| 220.0 + (i % 7) as f64 * 10.0).collect(),
        ));
        for channel in [Channel::Pitch, Channel::Contour] {
            let score = s.score_channel(channel, &silent, &sung);
            assert_eq!(score.similarity, 0.0);
            assert_eq!(score.status, ChannelStatus::InsufficientData);
        }
    }

    fn mfcc(m: FeatureMatrix) -> FeatureBundle {
        FeatureBundle::new(vec![], m, FeatureMatrix::default())
    }

    fn chroma(m: FeatureMatrix) -> FeatureBundle {
        FeatureBundle::new(vec![], FeatureMatrix::default(), m)
    }

    #[test]
    fn test_timbre_identity() {
        let s = scorer();
        let a = s.prepare(&mfcc(matrix(13, 40, |c, t| (c * t) as f64 * 0.1)));
        let same = s.score_channel(Channel::Mfcc, &a, &a);
        assert_relative_eq!(same.similarity, 100.0);
        assert_relative_eq!(same.distance.unwrap(), 0.0);
    }

    #[test]
    fn test_timbre_calibration_bands() {
        // Constant frames offset by `delta` in every coefficient: each cell
        // costs delta * sqrt(13), the diagonal path has 40 cells, so the
        // normalized distance is 40 * delta * sqrt(13) / (40 * 13)
        let s = scorer();
        let base = s.prepare(&mfcc(matrix(13, 40, |_, _| 1.0)));
        let at = |normalized: f64| {
            let delta = normalized * 13f64.sqrt();
            let shifted = s.prepare(&mfcc(matrix(13, 40, |_, _| 1.0 + delta)));
            s.score_channel(Channel::Mfcc, &base, &shifted)
        };

        let mid = at(6.75);
        assert_eq!(mid.status, ChannelStatus::Scored);
        assert_relative_eq!(mid.similarity, 65.0, epsilon = 1e-6);
        assert_relative_eq!(
            mid.distance.unwrap(),
            40.0 * 6.75 * 13.0,
            max_relative = 1e-9
        );

        assert_relative_eq!(at(7.25).similarity, 35.0, epsilon = 1e-6);
        assert_relative_eq!(at(5.0).similarity, 100.0, epsilon = 1e-6);
        assert_relative_eq!(at(9.0).similarity, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_alignment_limit_still_scores() {
        let calibration = CalibrationConfig {
            max_alignment_frames: 0,
            ..CalibrationConfig::default()
        };
        let s = ChannelScorer::new(calibration);
        let sung = s.prepare(&FeatureBundle::from_pitch(
            (0..60).map(|i| 220.0 + (i % 5) as f64 * 15.0).collect(),
        ));
        let score = s.score_channel(Channel::Pitch, &sung, &sung);
        assert_eq!(score.status, ChannelStatus::Scored);
        assert_relative_eq!(score.similarity, 100.0);
    }

    #[test]
    fn test_mismatched_coefficients_absorbed() {
        let s = scorer();
        let a = s.prepare(&mfcc(matrix(13, 20, |_, _| 1.0)));
        let b = s.prepare(&mfcc(matrix(26, 20, |_, _| 1.0)));
        let score = s.score_channel(Channel::Mfcc, &a, &b);
        assert_eq!(score.similarity, 0.0);
        assert_eq!(score.status, ChannelStatus::AlignmentFailure);
    }

    #[test]
    fn test_chroma_nan_absorbed() {
        let s = scorer();
        let good = s.prepare(&chroma(matrix(12, 20, |c, _| c as f64 / 12.0)));
        let bad = s.prepare(&chroma(matrix(12, 20, |_, t| if t == 3 { f64::NAN } else { 0.5 })));
        let score = s.score_channel(Channel::Chroma, &good, &bad);
        assert_eq!(score.status, ChannelStatus::AlignmentFailure);
        assert_eq!(score.similarity, 0.0);

        let ok = s.score_channel(Channel::Chroma, &good, &good);
        assert_relative_eq!(ok.similarity, 100.0);
    }

    #[test]
    fn test_empty_matrix_is_insufficient() {
        let s = scorer();
        let empty = s.prepare(&FeatureBundle::default());
        let score = s.score_channel(Channel::Chroma, &empty, &empty);
        assert_eq!(score.status, ChannelStatus::InsufficientData);
        assert_eq!(score.similarity, 0.0);
    }
}
