//! Error types for the matching engine
//!
//! Only configuration problems reach the caller. Channel-level kinds are
//! absorbed at the scorer boundary and turned into a zero similarity.

use crate::features::Channel;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// Fewer voiced or valid frames than the channel needs
    #[error("insufficient data for {channel} channel: {available} usable frames (need {required})")]
    InsufficientData {
        channel: Channel,
        available: usize,
        required: usize,
    },

    /// The DTW primitive could not produce a finite distance
    #[error("alignment failed: {0}")]
    AlignmentFailure(String),

    #[error("unknown channel name: {0:?}")]
    UnknownChannel(String),

    #[error("invalid weight {weight} for {channel} channel (must be finite and >= 0)")]
    InvalidWeight { channel: Channel, weight: f64 },

    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
}

impl MatchError {
    /// True for the kinds that must be surfaced to the caller
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MatchError::UnknownChannel(_)
                | MatchError::InvalidWeight { .. }
                | MatchError::InvalidCalibration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
