//! Player configuration.

use crate::error::{PlaybackError, PlaybackResult};
use serde::{Deserialize, Serialize};

/// Initial settings for a [`Player`](super::Player).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial playback rate multiplier (> 0)
    pub rate: f64,

    /// Volume applied to the graph when it is bound (>= 0)
    pub volume: f64,

    /// Whether the graph starts muted when it is bound
    pub muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            volume: 1.0,
            muted: false,
        }
    }
}

impl PlaybackConfig {
    /// Set the initial rate
    pub const fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the initial volume
    pub const fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Start muted or not
    pub const fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Check every field is usable.
    pub fn validate(&self) -> PlaybackResult<()> {
        if !is_valid_rate(self.rate) {
            return Err(PlaybackError::InvalidRate(self.rate));
        }
        if !is_valid_volume(self.volume) {
            return Err(PlaybackError::InvalidVolume(self.volume));
        }
        Ok(())
    }
}

pub(crate) fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

pub(crate) fn is_valid_volume(volume: f64) -> bool {
    volume.is_finite() && volume >= 0.0
}
