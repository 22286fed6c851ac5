//! Configuration for the matching engine
//!
//! Every calibration constant is configurable. The defaults are the values
//! the scorers were last tuned with; they should be re-validated against a
//! representative catalog before being trusted for a new one.

use crate::error::{MatchError, Result};
use crate::weights::{Profile, WeightConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One breakpoint of the timbre calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Normalized MFCC distance
    pub distance: f64,
    /// Similarity at that distance (0-100)
    pub similarity: f64,
}

impl CalibrationPoint {
    pub const fn new(distance: f64, similarity: f64) -> Self {
        Self {
            distance,
            similarity,
        }
    }
}

/// Scorer calibration constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Minimum voiced frames before a pitch channel is scored
    #[serde(default = "default_min_voiced_frames")]
    pub min_voiced_frames: usize,
    /// Minimum frames before an MFCC or chroma channel is scored
    #[serde(default = "default_min_matrix_frames")]
    pub min_matrix_frames: usize,
    /// Reference pitch for semitone conversion (Hz)
    #[serde(default = "default_reference_hz")]
    pub reference_hz: f64,
    /// Interval magnitude (std units) separating "same" from up/down
    #[serde(default = "default_contour_threshold")]
    pub contour_threshold: f64,
    /// Sequences longer than this are subsampled before alignment
    #[serde(default = "default_max_alignment_frames")]
    pub max_alignment_frames: usize,
    /// D for the interval channel
    #[serde(default = "default_interval_scale")]
    pub interval_scale: f64,
    /// D for the contour channel
    #[serde(default = "default_contour_scale")]
    pub contour_scale: f64,
    /// D for raw (median-relative or absolute) pitch comparisons
    #[serde(default = "default_raw_pitch_scale")]
    pub raw_pitch_scale: f64,
    /// D for the chroma channel
    #[serde(default = "default_chroma_scale")]
    pub chroma_scale: f64,
    /// Piecewise-linear timbre curve, ordered by distance
    #[serde(default = "default_mfcc_curve")]
    pub mfcc_curve: Vec<CalibrationPoint>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_voiced_frames: default_min_voiced_frames(),
            min_matrix_frames: default_min_matrix_frames(),
            reference_hz: default_reference_hz(),
            contour_threshold: default_contour_threshold(),
            max_alignment_frames: default_max_alignment_frames(),
            interval_scale: default_interval_scale(),
            contour_scale: default_contour_scale(),
            raw_pitch_scale: default_raw_pitch_scale(),
            chroma_scale: default_chroma_scale(),
            mfcc_curve: default_mfcc_curve(),
        }
    }
}

fn default_min_voiced_frames() -> usize {
    5
}
fn default_min_matrix_frames() -> usize {
    5
}
fn default_reference_hz() -> f64 {
    440.0
}
fn default_contour_threshold() -> f64 {
    0.2
}
fn default_max_alignment_frames() -> usize {
    500
}
fn default_interval_scale() -> f64 {
    2.0
}
fn default_contour_scale() -> f64 {
    1.5
}
fn default_raw_pitch_scale() -> f64 {
    1.2
}
fn default_chroma_scale() -> f64 {
    4.0
}
fn default_mfcc_curve() -> Vec<CalibrationPoint> {
    vec![
        CalibrationPoint::new(6.0, 100.0),
        CalibrationPoint::new(6.5, 80.0),
        CalibrationPoint::new(7.0, 50.0),
        CalibrationPoint::new(7.5, 20.0),
        CalibrationPoint::new(8.0, 0.0),
    ]
}

impl CalibrationConfig {
    /// Validate calibration constants
    pub fn validate(&self) -> Result<()> {
        if self.min_voiced_frames < 2 {
            return Err(invalid("min_voiced_frames must be >= 2"));
        }
        if self.min_matrix_frames == 0 {
            return Err(invalid("min_matrix_frames must be > 0"));
        }
        if !(self.reference_hz.is_finite() && self.reference_hz > 0.0) {
            return Err(invalid("reference_hz must be > 0"));
        }
        if !(self.contour_threshold.is_finite() && self.contour_threshold >= 0.0) {
            return Err(invalid("contour_threshold must be >= 0"));
        }
        if self.max_alignment_frames == 0 {
            return Err(invalid("max_alignment_frames must be > 0"));
        }
        for (name, scale) in [
            ("interval_scale", self.interval_scale),
            ("contour_scale", self.contour_scale),
            ("raw_pitch_scale", self.raw_pitch_scale),
            ("chroma_scale", self.chroma_scale),
        ] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(invalid(&format!("{} must be > 0, got {}", name, scale)));
            }
        }
        self.validate_mfcc_curve()
    }

    fn validate_mfcc_curve(&self) -> Result<()> {
        if self.mfcc_curve.is_empty() {
            return Err(invalid("mfcc_curve must have at least one point"));
        }
        for point in &self.mfcc_curve {
            if !point.distance.is_finite() || point.distance < 0.0 {
                return Err(invalid("mfcc_curve distances must be finite and >= 0"));
            }
            if !(0.0..=100.0).contains(&point.similarity) {
                return Err(invalid("mfcc_curve similarities must lie in [0, 100]"));
            }
        }
        for pair in self.mfcc_curve.windows(2) {
            if pair[1].distance <= pair[0].distance {
                return Err(invalid("mfcc_curve distances must be strictly increasing"));
            }
            if pair[1].similarity > pair[0].similarity {
                return Err(invalid("mfcc_curve similarities must be non-increasing"));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> MatchError {
    MatchError::InvalidCalibration(msg.to_string())
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// Channel set and default weights
    #[serde(default)]
    pub profile: Profile,
    /// Explicit weights, overriding the profile's
    #[serde(default)]
    pub weights: Option<BTreeMap<String, f64>>,
    /// Number of ranked entries reported as the top matches
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Catalog size from which candidates are scored on the rayon pool
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            profile: Profile::default(),
            weights: None,
            top_k: default_top_k(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_parallel_threshold() -> usize {
    8
}

impl MatcherConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: MatcherConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.calibration.validate()?;
        self.weight_config().map(|_| ())
    }

    /// Weights to use: the explicit table if present, else the profile's
    pub fn weight_config(&self) -> Result<WeightConfig> {
        match &self.weights {
            Some(table) => WeightConfig::from_pairs(table.iter().map(|(k, v)| (k.as_str(), *v))),
            None => Ok(self.profile.weights()),
        }
    }
}
