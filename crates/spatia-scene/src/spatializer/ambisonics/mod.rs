//! Ambisonic encode/decode.

mod decoder;
mod encoder;

pub use decoder::{AmbiDecoder, AmbiFlavor};
pub use encoder::{channels_for, AmbiEncoder, MAX_ORDER};

use super::{Dimensions, SpatialCache, Spatializer};
use crate::output::OutputBlock;
use crate::speaker::SpeakerLayout;
use crate::{Error, Result};
use spatia_core::{SceneConfig, Vec3};
use spatia_dsp::Crossover;
use std::sync::Arc;

/// Second decoder for the band above the crossover. The crossovers are
/// designed at the scene's sample rate in [`Spatializer::compile`].
#[derive(Debug)]
struct HighBand {
    decoder: AmbiDecoder,
    crossover_hz: f64,
    crossovers: Vec<Crossover>,
    buffer: Vec<f32>,
}

/// Encodes every source into a shared B-format block, then decodes the block
/// to the speakers once in [`Spatializer::finalize`].
///
/// The B-format block is allocated in [`Spatializer::compile`]; rendering
/// before compiling is silently dropped.
#[derive(Debug)]
pub struct AmbisonicsSpatializer {
    layout: Arc<SpeakerLayout>,
    encoder: AmbiEncoder,
    decoder: AmbiDecoder,
    high: Option<HighBand>,
    ambi: Vec<f32>,
    num_frames: usize,
}

impl AmbisonicsSpatializer {
    pub fn new(layout: Arc<SpeakerLayout>, dims: Dimensions, order: u8) -> Result<Self> {
        let encoder = AmbiEncoder::new(dims, order)?;
        let decoder = AmbiDecoder::new(&layout, dims, order, AmbiFlavor::default())?;
        Ok(Self {
            layout,
            encoder,
            decoder,
            high: None,
            ambi: Vec::new(),
            num_frames: 0,
        })
    }

    pub fn with_flavor(mut self, flavor: AmbiFlavor) -> Self {
        self.set_flavor(flavor);
        self
    }

    /// Decode below `crossover_hz` with `low` and above it with `high`.
    ///
    /// The crossover must also lie below the Nyquist frequency of the scene
    /// the spatializer joins, which [`Spatializer::compile`] checks.
    pub fn with_dual_band(mut self, low: AmbiFlavor, high: AmbiFlavor, crossover_hz: f64) -> Result<Self> {
        if !(crossover_hz.is_finite() && crossover_hz > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "crossover must be a positive frequency, got {} Hz",
                crossover_hz
            )));
        }
        self.decoder.set_flavor(low);
        let mut decoder = self.decoder.clone();
        decoder.set_flavor(high);
        tracing::debug!(?low, ?high, crossover_hz, "ambisonics dual-band decode");
        self.high = Some(HighBand {
            decoder,
            crossover_hz,
            crossovers: Vec::new(),
            buffer: Vec::new(),
        });
        Ok(self)
    }

    /// Decode flavor (of the low band, when decoding in two bands).
    pub fn flavor(&self) -> AmbiFlavor {
        self.decoder.flavor()
    }

    pub fn set_flavor(&mut self, flavor: AmbiFlavor) {
        self.decoder.set_flavor(flavor);
    }

    pub fn is_dual_band(&self) -> bool {
        self.high.is_some()
    }

    pub fn crossover_hz(&self) -> Option<f64> {
        self.high.as_ref().map(|h| h.crossover_hz)
    }

    pub fn encoder(&self) -> &AmbiEncoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &AmbiDecoder {
        &self.decoder
    }

    pub fn channels(&self) -> usize {
        self.encoder.channels()
    }

    /// The current block of B-format channels, channel-major.
    pub fn ambisonic_channels(&self) -> &[f32] {
        &self.ambi
    }
}

impl Spatializer for AmbisonicsSpatializer {
    fn name(&self) -> &'static str {
        "ambisonics"
    }

    fn layout(&self) -> &SpeakerLayout {
        &self.layout
    }

    fn compile(&mut self, config: &SceneConfig) -> Result<()> {
        let channels = self.encoder.channels();
        if let Some(high) = &mut self.high {
            let nyquist = config.sample_rate * 0.5;
            if high.crossover_hz >= nyquist {
                return Err(Error::InvalidParameter(format!(
                    "crossover {} Hz at or above Nyquist ({} Hz)",
                    high.crossover_hz, nyquist
                )));
            }
            high.crossovers = vec![Crossover::new(high.crossover_hz, config.sample_rate); channels];
            high.buffer = vec![0.0; channels * config.num_frames];
        }
        let num_frames = config.num_frames;
        self.num_frames = num_frames;
        self.ambi = vec![0.0; channels * num_frames];
        tracing::debug!(
            channels,
            order = self.encoder.order(),
            speakers = self.layout.len(),
            num_frames,
            "ambisonics compiled"
        );
        Ok(())
    }

    fn prepare(&mut self) {
        self.ambi.fill(0.0);
    }

    #[inline]
    fn render_sample(
        &mut self,
        _out: &mut OutputBlock<'_>,
        direction: &Vec3,
        sample: f32,
        frame: usize,
        _cache: &mut SpatialCache,
    ) {
        self.encoder.set_direction(direction);
        self.encoder.encode(&mut self.ambi, self.num_frames, frame, sample);
    }

    fn render_buffer(
        &mut self,
        _out: &mut OutputBlock<'_>,
        direction: &Vec3,
        samples: &[f32],
        _cache: &mut SpatialCache,
    ) {
        self.encoder.set_direction(direction);
        for (frame, &sample) in samples.iter().enumerate() {
            self.encoder.encode(&mut self.ambi, self.num_frames, frame, sample);
        }
    }

    fn finalize(&mut self, out: &mut OutputBlock<'_>) {
        let stride = self.num_frames;
        if let Some(high) = &mut self.high {
            for (c, xo) in high.crossovers.iter_mut().enumerate() {
                let range = c * stride..(c + 1) * stride;
                let (Some(lo), Some(hi)) = (self.ambi.get_mut(range.clone()), high.buffer.get_mut(range))
                else {
                    continue;
                };
                for (l, h) in lo.iter_mut().zip(hi.iter_mut()) {
                    let (band_lo, band_hi) = xo.process(*l);
                    *l = band_lo;
                    *h = band_hi;
                }
            }
            high.decoder.decode(out, &high.buffer, stride);
        }
        self.decoder.decode(out, &self.ambi, stride);
    }
}
