//! Spatialization algorithms.
//!
//! Every algorithm implements [`Spatializer`]. A listener drives its
//! spatializer through a fixed per-block sequence:
//!
//! ```text
//! prepare() -> render_sample()/render_buffer() for each source -> finalize()
//! ```
//!
//! `prepare` clears per-block accumulation state (skipping it leaves the
//! previous block's data in place); `finalize` flushes it to the outputs
//! (skipping it silences spatializers that only accumulate, such as
//! Ambisonics).

use crate::output::OutputBlock;
use crate::speaker::SpeakerLayout;
use crate::Result;
use spatia_core::{SceneConfig, Vec3};

pub mod ambisonics;
mod dbap;
mod stereo;
pub mod vbap;

pub use ambisonics::{AmbiDecoder, AmbiEncoder, AmbiFlavor, AmbisonicsSpatializer};
pub use dbap::Dbap;
pub use stereo::StereoPanner;
pub use vbap::{SpeakerTriple, Vbap};

/// Horizontal-only or full-sphere rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimensions {
    Two,
    #[default]
    Three,
}

impl Dimensions {
    pub fn count(self) -> u8 {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

/// Per-source lookup state a spatializer may reuse between calls.
///
/// Owned by the source so that several sources rendered through one
/// spatializer do not fight over a single cache. Only a starting hint; a stale
/// value never changes the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpatialCache {
    pub(crate) last_set: usize,
}

/// Maps a mono signal arriving from a direction onto a speaker layout.
///
/// `direction` is the source position relative to the listener, already
/// rotated into the listener's frame (+x ahead, +y left, +z up). It need not be
/// normalized and may be zero when source and listener coincide.
///
/// The `render_*`, `prepare` and `finalize` methods run on the audio thread and
/// must not allocate, block or fail.
pub trait Spatializer: Send {
    /// Short algorithm name, for logs.
    fn name(&self) -> &'static str;

    fn layout(&self) -> &SpeakerLayout;

    /// Precompute everything that depends on the layout, the block size or
    /// the sample rate. Control thread only.
    fn compile(&mut self, config: &SceneConfig) -> Result<()>;

    /// Start of block.
    fn prepare(&mut self) {}

    /// Pan one sample at `frame`.
    fn render_sample(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        sample: f32,
        frame: usize,
        cache: &mut SpatialCache,
    );

    /// Pan a block of samples (`samples[i]` lands on frame `i`) from a single
    /// direction.
    fn render_buffer(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        samples: &[f32],
        cache: &mut SpatialCache,
    ) {
        for (frame, &sample) in samples.iter().enumerate() {
            self.render_sample(out, direction, sample, frame, cache);
        }
    }

    /// End of block.
    fn finalize(&mut self, _out: &mut OutputBlock<'_>) {}
}
