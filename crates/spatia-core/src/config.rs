//! Scene configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Speed of sound in air at room temperature, in meters per second.
pub const DEFAULT_SPEED_OF_SOUND: f64 = 344.0;

/// Largest block the scene will preallocate for.
pub const MAX_BLOCK_SIZE: usize = 16384;

/// Configuration shared by every listener and source of an audio scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub sample_rate: f64,
    /// Frames rendered per block.
    pub num_frames: usize,
    /// Meters per second, used to turn distance into propagation delay.
    pub speed_of_sound: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            num_frames: 256,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.num_frames == 0 || self.num_frames > MAX_BLOCK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "num_frames {} out of range (1-{})",
                self.num_frames, MAX_BLOCK_SIZE
            )));
        }
        if !(self.speed_of_sound > 0.0 && self.speed_of_sound.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "speed_of_sound {} must be positive",
                self.speed_of_sound
            )));
        }
        Ok(())
    }

    /// Samples of propagation delay per meter of distance.
    #[inline]
    pub fn samples_per_meter(&self) -> f64 {
        self.sample_rate / self.speed_of_sound
    }

    /// Delay-line capacity needed to propagate sound over `distance` meters.
    pub fn delay_capacity_for(&self, distance: f64) -> usize {
        (self.samples_per_meter() * distance.max(0.0)).ceil() as usize
    }
}
