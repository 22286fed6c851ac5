//! Feature bundles handed to the engine by the external extractor

use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One feature-specific similarity computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Std-normalized melodic intervals
    Pitch,
    /// Up/down/same melodic shape
    Contour,
    /// Timbre
    Mfcc,
    /// Harmony
    Chroma,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Pitch,
        Channel::Contour,
        Channel::Mfcc,
        Channel::Chroma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Pitch => "pitch",
            Channel::Contour => "contour",
            Channel::Mfcc => "mfcc",
            Channel::Chroma => "chroma",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pitch" => Ok(Channel::Pitch),
            "contour" => Ok(Channel::Contour),
            "mfcc" => Ok(Channel::Mfcc),
            "chroma" => Ok(Channel::Chroma),
            _ => Err(MatchError::UnknownChannel(s.to_string())),
        }
    }
}

/// Feature-major matrix: `rows[coefficient][frame]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Build from time-major frames (`frames[frame][coefficient]`)
    pub fn from_frames(frames: &[Vec<f64>]) -> Self {
        let num_coeffs = frames.first().map(|f| f.len()).unwrap_or(0);
        let rows = (0..num_coeffs)
            .map(|c| frames.iter().map(|f| f.get(c).copied().unwrap_or(0.0)).collect())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of coefficients (rows)
    pub fn num_coeffs(&self) -> usize {
        self.rows.len()
    }

    /// Number of frames (columns), taken from the first row
    pub fn num_frames(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_coeffs() == 0 || self.num_frames() == 0
    }

    /// Every row has the same number of frames
    pub fn is_rectangular(&self) -> bool {
        let n = self.num_frames();
        self.rows.iter().all(|r| r.len() == n)
    }

    /// Transpose to time-major frames for alignment.
    ///
    /// Returns `None` for ragged matrices.
    pub fn frames(&self) -> Option<Vec<Vec<f64>>> {
        if !self.is_rectangular() {
            return None;
        }
        let frames = (0..self.num_frames())
            .map(|t| self.rows.iter().map(|row| row[t]).collect())
            .collect();
        Some(frames)
    }
}

/// Extracted features of one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    /// F0 per frame in Hz, 0 for unvoiced
    pub pitch_contour: Vec<f64>,
    /// `[coeff x frame]`
    #[serde(default)]
    pub mfcc: FeatureMatrix,
    /// `[12 x frame]`
    #[serde(default)]
    pub chroma: FeatureMatrix,
}

impl FeatureBundle {
    pub fn new(pitch_contour: Vec<f64>, mfcc: FeatureMatrix, chroma: FeatureMatrix) -> Self {
        Self {
            pitch_contour,
            mfcc,
            chroma,
        }
    }

    /// Bundle carrying only a pitch contour
    pub fn from_pitch(pitch_contour: Vec<f64>) -> Self {
        Self {
            pitch_contour,
            ..Default::default()
        }
    }

    /// Voiced frames in order; NaN, Inf and non-positive values count as unvoiced
    pub fn voiced_pitch(&self) -> Vec<f64> {
        voiced_frames(&self.pitch_contour)
    }
}

pub(crate) fn voiced_frames(contour: &[f64]) -> Vec<f64> {
    contour
        .iter()
        .copied()
        .filter(|f| f.is_finite() && *f > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse() {
        assert_eq!("pitch".parse::<Channel>().unwrap(), Channel::Pitch);
        assert_eq!(" Chroma ".parse::<Channel>().unwrap(), Channel::Chroma);
        assert!(matches!(
            "tempo".parse::<Channel>(),
            Err(MatchError::UnknownChannel(_))
        ));
    }

    #[test]
    fn test_matrix_transpose() {
        let m = FeatureMatrix::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(m.num_coeffs(), 2);
        assert_eq!(m.num_frames(), 3);
        let frames = m.frames().unwrap();
        assert_eq!(frames, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
        assert_eq!(FeatureMatrix::from_frames(&frames), m);
    }

    #[test]
    fn test_ragged_matrix_has_no_frames() {
        let m = FeatureMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(!m.is_rectangular());
        assert!(m.frames().is_none());
    }

    #[test]
    fn test_voiced_filter_drops_invalid_values() {
        let bundle =
            FeatureBundle::from_pitch(vec![0.0, 220.0, f64::NAN, -5.0, f64::INFINITY, 330.0]);
        assert_eq!(bundle.voiced_pitch(), vec![220.0, 330.0]);
    }
}
