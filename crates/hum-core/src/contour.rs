//! Melodic contour quantization (up / same / down)

use crate::config::CalibrationConfig;

pub const UP: f64 = 1.0;
pub const SAME: f64 = 0.0;
pub const DOWN: f64 = -1.0;

/// Quantizes std-normalized intervals into a ternary shape sequence
#[derive(Debug, Clone)]
pub struct ContourEncoder {
    threshold: f64,
}

impl ContourEncoder {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            threshold: config.contour_threshold,
        }
    }

    pub fn encode(&self, intervals: &[f64]) -> Vec<f64> {
        intervals.iter().map(|&i| self.quantize(i)).collect()
    }

    fn quantize(&self, interval: f64) -> f64 {
        if interval > self.threshold {
            UP
        } else if interval < -self.threshold {
            DOWN
        } else {
            SAME
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let encoder = ContourEncoder::new(&CalibrationConfig::default());
        let contour = encoder.encode(&[1.3, 0.2, -0.2, 0.05, -0.9, 0.21]);
        assert_eq!(contour, vec![UP, SAME, SAME, SAME, DOWN, UP]);
    }

    #[test]
    fn test_empty_in_empty_out() {
        let encoder = ContourEncoder::new(&CalibrationConfig::default());
        assert!(encoder.encode(&[]).is_empty());
    }
}
