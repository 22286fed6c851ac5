//! Elastic sequence alignment
//!
//! The aligner owns input preparation (subsampling, frame validation) and
//! delegates the distance itself to a [`DtwPrimitive`].

use crate::config::CalibrationConfig;
use crate::error::{MatchError, Result};

/// Dynamic time warping distance between two frame sequences.
///
/// Frames are time-major: `a[t]` is the feature vector at frame `t`.
/// Implementations use pointwise Euclidean cost.
pub trait DtwPrimitive: Send + Sync {
    fn distance(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<f64>;
}

/// Exact O(n*m) DTW with a two-row cost buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicDtw;

impl DtwPrimitive for ClassicDtw {
    fn distance(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<f64> {
        let m = b.len();
        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for fa in a {
            curr[0] = f64::INFINITY;
            for (j, fb) in b.iter().enumerate() {
                let cost = euclidean(fa, fb)?;
                let best = prev[j].min(prev[j + 1]).min(curr[j]);
                curr[j + 1] = cost + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        Ok(prev[m])
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MatchError::AlignmentFailure(format!(
            "frame dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Result of aligning two sequences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Accumulated DTW cost
    pub distance: f64,
    /// Length of the first sequence after subsampling
    pub len_a: usize,
    /// Length of the second sequence after subsampling
    pub len_b: usize,
}

impl Alignment {
    pub fn avg_len(&self) -> f64 {
        crate::numeric::avg_len(self.len_a, self.len_b)
    }
}

/// Sequence aligner
pub struct SequenceAligner {
    max_frames: usize,
    dtw: Box<dyn DtwPrimitive>,
}

impl SequenceAligner {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self::with_primitive(config, Box::new(ClassicDtw))
    }

    pub fn with_primitive(config: &CalibrationConfig, dtw: Box<dyn DtwPrimitive>) -> Self {
        Self {
            max_frames: config.max_alignment_frames.max(1),
            dtw,
        }
    }

    /// Align two scalar sequences
    pub fn align_scalar(&self, a: &[f64], b: &[f64]) -> Result<Alignment> {
        let a: Vec<Vec<f64>> = a.iter().map(|&v| vec![v]).collect();
        let b: Vec<Vec<f64>> = b.iter().map(|&v| vec![v]).collect();
        self.align_frames(&a, &b)
    }

    /// Align two time-major frame sequences.
    ///
    /// Callers must not pass empty sequences.
    pub fn align_frames(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Alignment> {
        if a.is_empty() || b.is_empty() {
            return Err(MatchError::AlignmentFailure(
                "cannot align an empty sequence".to_string(),
            ));
        }

        let a = subsample(a, self.max_frames);
        let b = subsample(b, self.max_frames);
        check_finite(&a)?;
        check_finite(&b)?;

        let distance = self.dtw.distance(&a, &b)?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(MatchError::AlignmentFailure(format!(
                "non-finite alignment cost: {}",
                distance
            )));
        }

        Ok(Alignment {
            distance,
            len_a: a.len(),
            len_b: b.len(),
        })
    }
}

impl std::fmt::Debug for SequenceAligner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAligner")
            .field("max_frames", &self.max_frames)
            .finish_non_exhaustive()
    }
}

/// Keep every `len / max_frames`-th frame once a sequence exceeds `max_frames`
fn subsample(frames: &[Vec<f64>], max_frames: usize) -> Vec<Vec<f64>> {
    if frames.len() <= max_frames {
        return frames.to_vec();
    }
    let stride = frames.len() / max_frames;
    frames.iter().step_by(stride).cloned().collect()
}

fn check_finite(frames: &[Vec<f64>]) -> Result<()> {
    if frames.iter().flatten().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MatchError::AlignmentFailure(
            "sequence contains NaN or infinite values".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn aligner() -> SequenceAligner {
        SequenceAligner::new(&CalibrationConfig::default())
    }

    #[test]
    fn test_identical_sequences_have_zero_distance() {
        let seq = [0.1, -0.5, 1.2, 0.0, 0.7];
        let alignment = aligner().align_scalar(&seq, &seq).unwrap();
        assert_relative_eq!(alignment.distance, 0.0);
        assert_eq!(alignment.len_a, 5);
    }

    #[test]
    fn test_time_stretch_is_absorbed() {
        let a = [0.0, 1.0, 2.0, 1.0];
        let b = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0];
        let alignment = aligner().align_scalar(&a, &b).unwrap();
        assert_relative_eq!(alignment.distance, 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Every pairing costs at least 1, the diagonal path costs exactly 3
        let alignment = aligner()
            .align_scalar(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0])
            .unwrap();
        assert_relative_eq!(alignment.distance, 3.0);
    }

    #[test]
    fn test_symmetric() {
        let a = [0.3, 1.1, -0.4, 2.0, 0.9, -1.3];
        let b = [0.0, 1.0, 1.5, -0.2, 0.4];
        let ab = aligner().align_scalar(&a, &b).unwrap();
        let ba = aligner().align_scalar(&b, &a).unwrap();
        assert_eq!(ab.distance, ba.distance);
    }

    #[test]
    fn test_multidimensional_euclidean_cost() {
        let a = vec![vec![0.0, 0.0]];
        let b = vec![vec![3.0, 4.0]];
        let alignment = aligner().align_frames(&a, &b).unwrap();
        assert_relative_eq!(alignment.distance, 5.0);
    }

    #[test]
    fn test_long_sequences_are_subsampled() {
        let long: Vec<f64> = (0..1200).map(|i| (i as f64 * 0.01).sin()).collect();
        let alignment = aligner().align_scalar(&long, &long[..300]).unwrap();
        // stride = 1200 / 500 = 2
        assert_eq!(alignment.len_a, 600);
        assert_eq!(alignment.len_b, 300);
    }

    #[test]
    fn test_zero_frame_limit_keeps_one_frame() {
        let config = CalibrationConfig {
            max_alignment_frames: 0,
            ..CalibrationConfig::default()
        };
        let seq = [0.5, 1.0, 1.5, 2.0];
        let alignment = SequenceAligner::new(&config).align_scalar(&seq, &seq).unwrap();
        assert_eq!(alignment.len_a, 1);
        assert_relative_eq!(alignment.distance, 0.0);
    }

    #[test]
    fn test_failures() {
        let a = aligner();
        assert!(matches!(
            a.align_scalar(&[], &[1.0]),
            Err(MatchError::AlignmentFailure(_))
        ));
        assert!(matches!(
            a.align_scalar(&[1.0, f64::NAN], &[1.0]),
            Err(MatchError::AlignmentFailure(_))
        ));
        assert!(matches!(
            a.align_frames(&[vec![1.0, 2.0]], &[vec![1.0]]),
            Err(MatchError::AlignmentFailure(_))
        ));
    }
}
