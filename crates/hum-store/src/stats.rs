//! Feature diagnostics
//!
//! Summaries used to spot broken extractor output (all-zero arrays, NaN or
//! infinite values, silent pitch tracks) before a file enters the catalog.

use hum_core::{FeatureBundle, FeatureMatrix};
use serde::Serialize;

/// Summary of one feature array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayStats {
    pub name: String,
    /// `[rows, columns]`; a contour is `[1, frames]`
    pub shape: [usize; 2],
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub non_zero: usize,
    pub size: usize,
    pub has_nan: bool,
    pub has_inf: bool,
}

impl ArrayStats {
    fn from_values<'a>(
        name: &str,
        shape: [usize; 2],
        values: impl Iterator<Item = &'a f64>,
    ) -> Self {
        let mut stats = Self {
            name: name.to_string(),
            shape,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            non_zero: 0,
            size: 0,
            has_nan: false,
            has_inf: false,
        };
        let mut sum = 0.0;
        let mut finite = 0usize;
        for &v in values {
            stats.size += 1;
            if v != 0.0 {
                stats.non_zero += 1;
            }
            if v.is_nan() {
                stats.has_nan = true;
                continue;
            }
            if v.is_infinite() {
                stats.has_inf = true;
                continue;
            }
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
            sum += v;
            finite += 1;
        }
        if finite == 0 {
            stats.min = 0.0;
            stats.max = 0.0;
        } else {
            stats.mean = sum / finite as f64;
        }
        stats
    }

    fn from_matrix(name: &str, matrix: &FeatureMatrix) -> Self {
        Self::from_values(
            name,
            [matrix.num_coeffs(), matrix.num_frames()],
            matrix.rows().iter().flatten(),
        )
    }

    pub fn all_zero(&self) -> bool {
        self.non_zero == 0
    }

    /// Human-readable problems with this array
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.all_zero() {
            warnings.push(format!("{}: all values are zero", self.name));
        }
        if self.has_nan {
            warnings.push(format!("{}: contains NaN values", self.name));
        }
        if self.has_inf {
            warnings.push(format!("{}: contains infinite values", self.name));
        }
        warnings
    }
}

/// Diagnostics for a whole bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStats {
    pub pitch: ArrayStats,
    pub mfcc: ArrayStats,
    pub chroma: ArrayStats,
    pub voiced_frames: usize,
    /// Lowest voiced pitch (Hz)
    pub voiced_min_hz: Option<f64>,
    pub voiced_max_hz: Option<f64>,
    pub voiced_mean_hz: Option<f64>,
}

impl FeatureStats {
    pub fn compute(bundle: &FeatureBundle) -> Self {
        let voiced = bundle.voiced_pitch();
        let voiced_mean_hz = if voiced.is_empty() {
            None
        } else {
            Some(voiced.iter().sum::<f64>() / voiced.len() as f64)
        };
        Self {
            pitch: ArrayStats::from_values(
                "pitch",
                [1, bundle.pitch_contour.len()],
                bundle.pitch_contour.iter(),
            ),
            mfcc: ArrayStats::from_matrix("mfcc", &bundle.mfcc),
            chroma: ArrayStats::from_matrix("chroma", &bundle.chroma),
            voiced_frames: voiced.len(),
            voiced_min_hz: voiced.iter().copied().reduce(f64::min),
            voiced_max_hz: voiced.iter().copied().reduce(f64::max),
            voiced_mean_hz,
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = [&self.pitch, &self.mfcc, &self.chroma]
            .iter()
            .flat_map(|s| s.warnings())
            .collect();
        if self.voiced_frames == 0 {
            warnings.push("pitch: no voiced frames".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_stats() {
        let bundle = FeatureBundle::from_pitch(vec![0.0, 200.0, 0.0, 300.0, 250.0]);
        let stats = FeatureStats::compute(&bundle);
        assert_eq!(stats.pitch.shape, [1, 5]);
        assert_eq!(stats.pitch.non_zero, 3);
        assert_eq!(stats.voiced_frames, 3);
        assert_eq!(stats.voiced_min_hz, Some(200.0));
        assert_eq!(stats.voiced_max_hz, Some(300.0));
        assert_eq!(stats.voiced_mean_hz, Some(250.0));
    }

    #[test]
    fn test_warnings() {
        let bundle = FeatureBundle::new(
            vec![0.0; 4],
            FeatureMatrix::new(vec![vec![1.0, f64::NAN], vec![f64::INFINITY, 2.0]]),
            FeatureMatrix::new(vec![vec![0.0; 3]; 12]),
        );
        let stats = FeatureStats::compute(&bundle);
        assert!(stats.mfcc.has_nan);
        assert!(stats.mfcc.has_inf);
        assert_eq!(stats.mfcc.max, 2.0);
        assert!(stats.chroma.all_zero());

        let warnings = stats.warnings();
        assert!(warnings.iter().any(|w| w == "pitch: all values are zero"));
        assert!(warnings.iter().any(|w| w == "pitch: no voiced frames"));
        assert!(warnings.iter().any(|w| w.starts_with("mfcc: contains NaN")));
        assert!(warnings.iter().any(|w| w == "chroma: all values are zero"));
    }
}
