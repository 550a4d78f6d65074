//! Loudspeakers and the layouts they form.

use crate::{Error, Result};
use spatia_core::{direction_from_degrees, Vec3};
use std::collections::HashSet;

/// A loudspeaker in the listening space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speaker {
    /// Index into the output device's channels.
    pub device_channel: usize,
    /// Degrees counter-clockwise from front (90 = left).
    pub azimuth: f64,
    /// Degrees up from the horizontal plane.
    pub elevation: f64,
    /// Distance from the center of the listening space, meters.
    pub radius: f64,
    pub gain: f32,
}

impl Speaker {
    pub fn new(device_channel: usize, azimuth: f64, elevation: f64) -> Self {
        Self {
            device_channel,
            azimuth,
            elevation,
            radius: 1.0,
            gain: 1.0,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Unit vector pointing at the speaker.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        direction_from_degrees(self.azimuth, self.elevation)
    }

    /// Cartesian position (direction scaled by radius).
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.direction() * self.radius
    }
}

/// Ordered, immutable set of speakers.
///
/// Built once on the control thread and shared read-only (usually through an
/// `Arc`) by the spatializers that render to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerLayout {
    speakers: Vec<Speaker>,
}

impl SpeakerLayout {
    /// Validate and wrap a list of speakers.
    ///
    /// Fails on an empty list, non-finite angles, non-positive radius or a device
    /// channel used twice.
    pub fn new(speakers: Vec<Speaker>) -> Result<Self> {
        if speakers.is_empty() {
            return Err(Error::InvalidLayout("layout has no speakers".into()));
        }
        let mut channels = HashSet::with_capacity(speakers.len());
        for (i, s) in speakers.iter().enumerate() {
            if !(s.azimuth.is_finite() && s.elevation.is_finite()) {
                return Err(Error::InvalidLayout(format!(
                    "speaker {} has non-finite angles ({}, {})",
                    i, s.azimuth, s.elevation
                )));
            }
            if s.radius.is_nan() || s.radius <= 0.0 {
                return Err(Error::InvalidLayout(format!(
                    "speaker {} has radius {}",
                    i, s.radius
                )));
            }
            if !channels.insert(s.device_channel) {
                return Err(Error::InvalidLayout(format!(
                    "device channel {} assigned to more than one speaker",
                    s.device_channel
                )));
            }
        }
        tracing::debug!(speakers = speakers.len(), "speaker layout built");
        Ok(Self { speakers })
    }

    /// Layout from `(azimuth, elevation, device_channel, gain)` tuples.
    pub fn from_tuples(tuples: &[(f64, f64, usize, f32)]) -> Result<Self> {
        Self::new(
            tuples
                .iter()
                .map(|&(az, el, ch, gain)| Speaker::new(ch, az, el).with_gain(gain))
                .collect(),
        )
    }

    /// `n` speakers evenly spaced on the horizontal circle, the first at `phase`
    /// degrees, on channels `0..n`.
    pub fn ring(n: usize, phase: f64) -> Result<Self> {
        Self::new(
            (0..n)
                .map(|i| Speaker::new(i, 360.0 / n as f64 * i as f64 + phase, 0.0))
                .collect(),
        )
    }

    /// Left at +30°, right at -30°.
    pub fn stereo() -> Self {
        Self {
            speakers: vec![Speaker::new(0, 30.0, 0.0), Speaker::new(1, -30.0, 0.0)],
        }
    }

    /// Headphones: left ear (90°) on channel 0, right ear (270°) on channel 1.
    pub fn headset() -> Self {
        Self {
            speakers: vec![Speaker::new(0, 90.0, 0.0), Speaker::new(1, 270.0, 0.0)],
        }
    }

    /// Eight speakers every 45°, starting in front.
    pub fn octal() -> Self {
        Self {
            speakers: (0..8)
                .map(|i| Speaker::new(i, 45.0 * i as f64, 0.0))
                .collect(),
        }
    }

    /// Four speakers at ear height on the diagonals plus four above them at 60°.
    pub fn cube() -> Self {
        let mut speakers = Vec::with_capacity(8);
        for i in 0..4 {
            let az = 45.0 + 90.0 * i as f64;
            speakers.push(Speaker::new(i, az, 0.0));
            speakers.push(Speaker::new(4 + i, az, 60.0).with_radius(5.0_f64.sqrt()));
        }
        Self { speakers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    #[inline]
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Speaker> {
        self.speakers.iter()
    }

    /// Output channels needed to address every speaker.
    pub fn num_output_channels(&self) -> usize {
        self.speakers
            .iter()
            .map(|s| s.device_channel + 1)
            .max()
            .unwrap_or(0)
    }

    /// True when every speaker sits on the horizontal plane.
    pub fn is_horizontal(&self) -> bool {
        self.speakers.iter().all(|s| s.elevation == 0.0)
    }
}
