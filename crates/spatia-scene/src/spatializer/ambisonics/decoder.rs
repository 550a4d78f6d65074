//! B-format decoding onto a speaker layout.

use super::encoder::{channel_degrees, channels_for, fuma_weights, MAX_ORDER};
use crate::output::OutputBlock;
use crate::spatializer::Dimensions;
use crate::speaker::SpeakerLayout;
use crate::{Error, Result};

/// Per-degree weighting applied when decoding.
///
/// Higher flavors trade localization sharpness for smoother panning and
/// fewer out-of-phase contributions from speakers opposite the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiFlavor {
    /// Unweighted projection.
    Basic,
    #[default]
    Default,
    /// No speaker ever plays in anti-phase.
    InPhase,
    /// Maximizes the energy vector, best above roughly 700 Hz.
    MaxRe,
}

// [degree][order]
type WeightTable = [[f32; 5]; 5];

const BASIC: WeightTable = [
    [1.0, 1.0, 1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, 1.0, 1.0],
    [0.0, 0.0, 1.0, 1.0, 1.0],
    [0.0, 0.0, 0.0, 1.0, 1.0],
    [0.0, 0.0, 0.0, 0.0, 1.0],
];

const DEFAULT: WeightTable = [
    [1.0, 0.707, 0.707, 0.707, 0.707],
    [0.0, 1.0, 0.75, 0.75, 0.75],
    [0.0, 0.0, 0.5, 0.5, 0.5],
    [0.0, 0.0, 0.0, 0.3, 0.3],
    [0.0, 0.0, 0.0, 0.0, 0.1],
];

const IN_PHASE: WeightTable = [
    [1.0, 1.0, 1.0, 1.0, 1.0],
    [0.0, 0.333, 0.5, 0.6, 0.667],
    [0.0, 0.0, 0.1, 0.2, 0.286],
    [0.0, 0.0, 0.0, 0.029, 0.071],
    [0.0, 0.0, 0.0, 0.0, 0.008],
];

const MAX_RE: WeightTable = [
    [1.0, 1.0, 1.0, 1.0, 1.0],
    [0.0, 0.577, 0.775, 0.861, 0.906],
    [0.0, 0.0, 0.4, 0.612, 0.732],
    [0.0, 0.0, 0.0, 0.305, 0.501],
    [0.0, 0.0, 0.0, 0.0, 0.246],
];

impl AmbiFlavor {
    fn table(self) -> &'static WeightTable {
        match self {
            AmbiFlavor::Basic => &BASIC,
            AmbiFlavor::Default => &DEFAULT,
            AmbiFlavor::InPhase => &IN_PHASE,
            AmbiFlavor::MaxRe => &MAX_RE,
        }
    }

    /// Weight of spherical-harmonic `degree` when decoding at `order`.
    pub fn degree_weight(self, degree: usize, order: u8) -> f32 {
        self.table()
            .get(degree)
            .and_then(|row| row.get(order as usize))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Projects B-format channels onto each speaker's own encoding direction.
///
/// The decode matrix holds, per speaker, the FuMa weights of the speaker
/// direction scaled by the speaker gain; the flavor then weights each channel
/// by its degree. Speakers with zero gain are skipped.
#[derive(Debug, Clone)]
pub struct AmbiDecoder {
    dims: Dimensions,
    order: u8,
    flavor: AmbiFlavor,
    channels: usize,
    degrees: Vec<usize>,
    channel_weights: Vec<f32>,
    // speakers x channels
    matrix: Vec<f32>,
    device_channels: Vec<usize>,
    speaker_gains: Vec<f32>,
}

impl AmbiDecoder {
    pub fn new(layout: &SpeakerLayout, dims: Dimensions, order: u8, flavor: AmbiFlavor) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(Error::UnsupportedAmbisonics {
                dimensions: dims.count(),
                order,
            });
        }
        let channels = channels_for(dims, order);
        let mut matrix = vec![0.0; layout.len() * channels];
        for (row, speaker) in matrix.chunks_exact_mut(channels).zip(layout.iter()) {
            let dir = speaker.direction();
            let z = match dims {
                Dimensions::Two => 0.0,
                Dimensions::Three => dir.z as f32,
            };
            fuma_weights(row, dims, order, dir.x as f32, dir.y as f32, z);
            for w in row.iter_mut() {
                *w *= speaker.gain;
            }
        }

        let mut decoder = Self {
            dims,
            order,
            flavor,
            channels,
            degrees: channel_degrees(dims, order),
            channel_weights: vec![0.0; channels],
            matrix,
            device_channels: layout.iter().map(|s| s.device_channel).collect(),
            speaker_gains: layout.iter().map(|s| s.gain).collect(),
        };
        decoder.set_flavor(flavor);
        Ok(decoder)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn num_speakers(&self) -> usize {
        self.device_channels.len()
    }

    pub fn flavor(&self) -> AmbiFlavor {
        self.flavor
    }

    pub fn set_flavor(&mut self, flavor: AmbiFlavor) {
        self.flavor = flavor;
        for (w, &degree) in self.channel_weights.iter_mut().zip(&self.degrees) {
            *w = flavor.degree_weight(degree, self.order);
        }
    }

    /// Contribution of ambisonic `channel` to `speaker`.
    #[inline]
    pub fn decode_weight(&self, speaker: usize, channel: usize) -> f32 {
        self.channel_weights[channel] * self.matrix[speaker * self.channels + channel]
    }

    /// Accumulate the decoded speaker feeds of `ambi` (channel-major, channels
    /// `stride` frames apart) into `out`.
    pub fn decode(&self, out: &mut OutputBlock<'_>, ambi: &[f32], stride: usize) {
        let frames = stride.min(out.num_frames());
        for (s, &device_channel) in self.device_channels.iter().enumerate() {
            if self.speaker_gains[s] == 0.0 {
                continue;
            }
            let dest = out.channel_mut(device_channel);
            if dest.is_empty() {
                continue;
            }
            for c in 0..self.channels {
                let w = self.decode_weight(s, c);
                let Some(src) = ambi.get(c * stride..c * stride + frames) else {
                    continue;
                };
                for (o, &i) in dest.iter_mut().zip(src) {
                    *o += i * w;
                }
            }
        }
    }
}
