//! Constant-power stereo panning.

use super::{SpatialCache, Spatializer};
use crate::output::OutputBlock;
use crate::speaker::SpeakerLayout;
use crate::{Error, Result};
use spatia_core::{SceneConfig, Vec3};
use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

/// Constant-power pan between two speakers.
///
/// The pan position is the source's lateral component: fully left at +90°
/// azimuth, fully right at -90°, centered ahead, behind, above and when the
/// source sits on the listener. The two speakers' own angles only decide which
/// one is left.
#[derive(Debug)]
pub struct StereoPanner {
    layout: Arc<SpeakerLayout>,
    left: (usize, f32),
    right: (usize, f32),
}

impl StereoPanner {
    pub fn new(layout: Arc<SpeakerLayout>) -> Result<Self> {
        let [a, b] = layout.speakers() else {
            return Err(Error::InvalidLayout(format!(
                "stereo panning needs exactly 2 speakers, got {}",
                layout.len()
            )));
        };
        let (left, right) = if a.direction().y >= b.direction().y {
            (a, b)
        } else {
            (b, a)
        };
        let left = (left.device_channel, left.gain);
        let right = (right.device_channel, right.gain);
        Ok(Self {
            layout,
            left,
            right,
        })
    }

    /// `(left, right)` gains for a source direction.
    #[inline]
    pub fn gains(direction: &Vec3) -> (f32, f32) {
        let norm = direction.norm();
        // -1 = hard left, +1 = hard right
        let pan = if norm > 1e-12 {
            (-direction.y / norm) as f32
        } else {
            0.0
        };
        let theta = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
        (theta.cos(), theta.sin())
    }
}

impl Spatializer for StereoPanner {
    fn name(&self) -> &'static str {
        "stereo"
    }

    fn layout(&self) -> &SpeakerLayout {
        &self.layout
    }

    fn compile(&mut self, _config: &SceneConfig) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn render_sample(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        sample: f32,
        frame: usize,
        _cache: &mut SpatialCache,
    ) {
        let (gl, gr) = Self::gains(direction);
        out.add(self.left.0, frame, sample * gl * self.left.1);
        out.add(self.right.0, frame, sample * gr * self.right.1);
    }

    fn render_buffer(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        samples: &[f32],
        _cache: &mut SpatialCache,
    ) {
        let (gl, gr) = Self::gains(direction);
        let (gl, gr) = (gl * self.left.1, gr * self.right.1);
        for (frame, &sample) in samples.iter().enumerate() {
            out.add(self.left.0, frame, sample * gl);
            out.add(self.right.0, frame, sample * gr);
        }
    }
}
