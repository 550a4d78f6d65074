//! Distance-based amplitude panning.

use super::{SpatialCache, Spatializer};
use crate::output::OutputBlock;
use crate::speaker::SpeakerLayout;
use crate::{Error, Result};
use spatia_core::{SceneConfig, Vec3};
use std::sync::Arc;

/// Gain per speaker from the distance between the source direction and the
/// speaker direction on the unit sphere:
///
/// ```text
/// gain = (1 / (1 + coefficient * distance)) ^ spread
/// ```
///
/// A speaker the source points straight at always gets unity; raising `spread`
/// narrows the image by pulling every other speaker down. No triangulation, so
/// any layout works, including irregular and sparse ones.
#[derive(Debug)]
pub struct Dbap {
    layout: Arc<SpeakerLayout>,
    directions: Vec<Vec3>,
    channels: Vec<usize>,
    speaker_gains: Vec<f32>,
    coefficient: f32,
    spread: f32,
}

impl Dbap {
    pub const DEFAULT_COEFFICIENT: f32 = 1.0;
    pub const DEFAULT_SPREAD: f32 = 1.0;

    pub fn new(layout: Arc<SpeakerLayout>) -> Self {
        Self {
            directions: layout.iter().map(|s| s.direction()).collect(),
            channels: layout.iter().map(|s| s.device_channel).collect(),
            speaker_gains: layout.iter().map(|s| s.gain).collect(),
            layout,
            coefficient: Self::DEFAULT_COEFFICIENT,
            spread: Self::DEFAULT_SPREAD,
        }
    }

    pub fn with_spread(mut self, spread: f32) -> Result<Self> {
        self.set_spread(spread)?;
        Ok(self)
    }

    pub fn with_coefficient(mut self, coefficient: f32) -> Result<Self> {
        self.set_coefficient(coefficient)?;
        Ok(self)
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    pub fn set_spread(&mut self, spread: f32) -> Result<()> {
        if !(spread.is_finite() && spread > 0.0) {
            return Err(Error::InvalidParameter(format!("dbap spread {} must be positive", spread)));
        }
        self.spread = spread;
        Ok(())
    }

    pub fn set_coefficient(&mut self, coefficient: f32) -> Result<()> {
        if !(coefficient.is_finite() && coefficient >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "dbap coefficient {} must be non-negative",
                coefficient
            )));
        }
        self.coefficient = coefficient;
        Ok(())
    }

    /// Gain of `speaker` for a source in `direction` (before the speaker's own
    /// gain). A zero direction is equidistant from every speaker.
    #[inline]
    pub fn speaker_gain(&self, direction: &Vec3, speaker: usize) -> f32 {
        let unit = direction.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
        self.gain_for_unit(&unit, speaker)
    }

    #[inline]
    fn gain_for_unit(&self, unit: &Vec3, speaker: usize) -> f32 {
        let distance = (unit - self.directions[speaker]).norm() as f32;
        (1.0 / (1.0 + self.coefficient * distance)).powf(self.spread)
    }
}

impl Spatializer for Dbap {
    fn name(&self) -> &'static str {
        "dbap"
    }

    fn layout(&self) -> &SpeakerLayout {
        &self.layout
    }

    fn compile(&mut self, _config: &SceneConfig) -> Result<()> {
        Ok(())
    }

    fn render_sample(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        sample: f32,
        frame: usize,
        _cache: &mut SpatialCache,
    ) {
        let unit = direction.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
        for k in 0..self.directions.len() {
            let gain = self.gain_for_unit(&unit, k) * self.speaker_gains[k];
            out.add(self.channels[k], frame, sample * gain);
        }
    }

    fn render_buffer(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        samples: &[f32],
        _cache: &mut SpatialCache,
    ) {
        let unit = direction.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
        for k in 0..self.directions.len() {
            let gain = self.gain_for_unit(&unit, k) * self.speaker_gains[k];
            for (frame, &sample) in samples.iter().enumerate() {
                out.add(self.channels[k], frame, sample * gain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn octal() -> Arc<SpeakerLayout> {
        Arc::new(SpeakerLayout::octal())
    }

    #[test]
    fn test_coincident_speaker_is_loudest() {
        let dbap = Dbap::new(octal());
        let dir = SpeakerLayout::octal().speakers()[2].direction();
        let gains: Vec<f32> = (0..8).map(|k| dbap.speaker_gain(&dir, k)).collect();
        assert!((gains[2] - 1.0).abs() < 1e-6);
        for (k, g) in gains.iter().enumerate() {
            if k != 2 {
                assert!(*g < gains[2], "speaker {} gain {} >= {}", k, g, gains[2]);
            }
        }
        // neighbors beat the far side
        assert!(gains[1] > gains[6]);
    }

    #[test]
    fn test_spread_narrows_image() {
        let dir = Vec3::x();
        let mut previous: Option<Vec<f32>> = None;
        for spread in [0.5, 1.0, 2.0, 4.0] {
            let dbap = Dbap::new(octal()).with_spread(spread).unwrap();
            let gains: Vec<f32> = (0..8).map(|k| dbap.speaker_gain(&dir, k)).collect();
            assert!((gains[0] - 1.0).abs() < 1e-6);
            if let Some(prev) = previous {
                for k in 1..8 {
                    assert!(gains[k] < prev[k], "spread {} speaker {}", spread, k);
                }
            }
            previous = Some(gains);
        }
    }

    #[test]
    fn test_centered_source_is_uniform() {
        let mut dbap = Dbap::new(octal());
        let mut data = vec![0.0; 8];
        let mut out = OutputBlock::new(&mut data, 1);
        dbap.render_sample(&mut out, &Vec3::zeros(), 1.0, 0, &mut SpatialCache::default());
        assert!(data.iter().all(|&g| (g - 0.5).abs() < 1e-6), "data={:?}", data);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Dbap::new(octal()).with_spread(0.0).is_err());
        assert!(Dbap::new(octal()).with_coefficient(-1.0).is_err());
        assert!(Dbap::new(octal()).with_coefficient(f32::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_gains_bounded(x in -5.0f64..5.0, y in -5.0f64..5.0, z in -5.0f64..5.0, spread in 0.1f32..8.0) {
            let dbap = Dbap::new(octal()).with_spread(spread).unwrap();
            for k in 0..8 {
                let g = dbap.speaker_gain(&Vec3::new(x, y, z), k);
                prop_assert!(g > 0.0 && g <= 1.0 + 1e-6);
            }
        }
    }
}
