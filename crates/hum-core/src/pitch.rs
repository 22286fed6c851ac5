//! Pitch contour normalization
//!
//! Turns an absolute F0 contour (Hz per frame) into representations that can
//! be compared across singers. Interval mode removes the key (first
//! differences of semitones) and the performance scale (division by the
//! interval standard deviation).

use crate::config::CalibrationConfig;
use crate::features::voiced_frames;
use crate::numeric::{diff, hz_to_semitones, median, min_max, std_dev};
use serde::{Deserialize, Serialize};

/// How a pitch contour is represented before alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchRepresentation {
    /// Std-normalized semitone intervals between consecutive voiced frames
    Intervals,
    /// Semitones relative to the median voiced pitch, range-scaled to [0, 1]
    MedianRelative,
    /// Semitones relative to the reference pitch (not key-invariant)
    Absolute,
}

/// Pitch normalizer
#[derive(Debug, Clone)]
pub struct PitchNormalizer {
    min_voiced_frames: usize,
    reference_hz: f64,
}

impl PitchNormalizer {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            min_voiced_frames: config.min_voiced_frames,
            reference_hz: config.reference_hz,
        }
    }

    pub fn min_voiced_frames(&self) -> usize {
        self.min_voiced_frames
    }

    /// Normalize `contour` into the requested representation.
    ///
    /// An empty result means too few voiced frames.
    pub fn normalize(&self, contour: &[f64], repr: PitchRepresentation) -> Vec<f64> {
        match repr {
            PitchRepresentation::Intervals => self.relative_intervals(contour),
            PitchRepresentation::MedianRelative => self.median_relative(contour),
            PitchRepresentation::Absolute => self.absolute_semitones(contour),
        }
    }

    /// Voiced semitones relative to the reference, or `None` below threshold
    fn voiced_semitones(&self, contour: &[f64]) -> Option<Vec<f64>> {
        let voiced = voiced_frames(contour);
        if voiced.len() < self.min_voiced_frames {
            log::trace!(
                "Only {} voiced frames (need {})",
                voiced.len(),
                self.min_voiced_frames
            );
            return None;
        }
        Some(
            voiced
                .iter()
                .map(|&f| hz_to_semitones(f, self.reference_hz))
                .collect(),
        )
    }

    /// Key- and tempo-invariant interval sequence, length `voiced - 1`
    pub fn relative_intervals(&self, contour: &[f64]) -> Vec<f64> {
        let Some(semitones) = self.voiced_semitones(contour) else {
            return Vec::new();
        };

        let mut intervals = diff(&semitones);

        // Monotone contours keep their raw (all-zero) intervals
        if let Some(sd) = std_dev(&intervals) {
            if sd > 0.0 {
                intervals.iter_mut().for_each(|i| *i /= sd);
            }
        }

        intervals
    }

    /// Full-contour representation relative to the median voiced pitch
    pub fn median_relative(&self, contour: &[f64]) -> Vec<f64> {
        let voiced = voiced_frames(contour);
        if voiced.len() < self.min_voiced_frames {
            return Vec::new();
        }
        let Some(center) = median(&voiced) else {
            return Vec::new();
        };

        let relative: Vec<f64> = voiced.iter().map(|&f| hz_to_semitones(f, center)).collect();

        match min_max(&relative) {
            Some((lo, hi)) if hi > lo => relative.iter().map(|v| (v - lo) / (hi - lo)).collect(),
            _ => vec![0.0; relative.len()],
        }
    }

    /// Absolute semitones relative to the reference pitch
    pub fn absolute_semitones(&self, contour: &[f64]) -> Vec<f64> {
        self.voiced_semitones(contour).unwrap_or_default()
    }
}
