//! Channel weights and named scoring profiles

use crate::error::{MatchError, Result};
use crate::features::Channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-channel fusion weights.
///
/// The keys are the enabled channels. Fusion is a weighted sum, so weights
/// only yield a 0-100 total when they add up to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    weights: BTreeMap<Channel, f64>,
}

impl WeightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a channel weight
    pub fn with(mut self, channel: Channel, weight: f64) -> Result<Self> {
        self.set(channel, weight)?;
        Ok(self)
    }

    pub fn set(&mut self, channel: Channel, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(MatchError::InvalidWeight { channel, weight });
        }
        self.weights.insert(channel, weight);
        Ok(())
    }

    /// Build from `(channel name, weight)` pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut config = Self::new();
        for (name, weight) in pairs {
            let channel: Channel = name.parse()?;
            config.set(channel, weight)?;
        }
        Ok(config)
    }

    /// Re-check every weight; needed for configs that arrive through serde
    pub fn validate(&self) -> Result<()> {
        for (&channel, &weight) in &self.weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidWeight { channel, weight });
            }
        }
        Ok(())
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.weights.get(&channel).copied()
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.weights.contains_key(&channel)
    }

    /// Enabled channels in canonical order
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.weights.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.weights.iter().map(|(c, w)| (*c, *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Rescale so the weights add up to 1. All-zero weights are left alone.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self {
            weights: self.weights.iter().map(|(c, w)| (*c, w / total)).collect(),
        }
    }
}

/// Named channel selections with their default weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Relative pitch and contour only
    #[default]
    Melody,
    /// All four channels
    Full,
}

impl Profile {
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Profile::Melody => &[Channel::Pitch, Channel::Contour],
            Profile::Full => &Channel::ALL,
        }
    }

    pub fn weights(&self) -> WeightConfig {
        let pairs: &[(Channel, f64)] = match self {
            Profile::Melody => &[(Channel::Pitch, 0.8), (Channel::Contour, 0.2)],
            Profile::Full => &[
                (Channel::Pitch, 0.4),
                (Channel::Contour, 0.2),
                (Channel::Mfcc, 0.2),
                (Channel::Chroma, 0.2),
            ],
        };
        WeightConfig {
            weights: pairs.iter().copied().collect(),
        }
    }
}
