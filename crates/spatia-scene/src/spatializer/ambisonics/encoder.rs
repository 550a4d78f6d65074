//! Furse-Malham B-format encoding.

use crate::spatializer::Dimensions;
use crate::{Error, Result};
use spatia_core::{direction_from_degrees, Vec3};
use std::f32::consts::FRAC_1_SQRT_2;

/// Highest supported order.
pub const MAX_ORDER: u8 = 3;

/// Number of B-format channels for `dims` and `order`.
///
/// `2 * order + 1` horizontally, `(order + 1)^2` with height.
pub const fn channels_for(dims: Dimensions, order: u8) -> usize {
    let order = order as usize;
    match dims {
        Dimensions::Two => 2 * order + 1,
        Dimensions::Three => (order + 1) * (order + 1),
    }
}

fn check(dims: Dimensions, order: u8) -> Result<()> {
    if order > MAX_ORDER {
        return Err(Error::UnsupportedAmbisonics {
            dimensions: dims.count(),
            order,
        });
    }
    Ok(())
}

/// Spherical-harmonic degree of each channel, in channel order.
///
/// Horizontal components come first (`W X Y U V P Q`), followed by the height
/// components (`Z S T R N O L M K`).
pub(crate) fn channel_degrees(dims: Dimensions, order: u8) -> Vec<usize> {
    let mut degrees = vec![0];
    for n in 1..=order as usize {
        degrees.extend([n, n]);
    }
    if dims == Dimensions::Three {
        for n in 1..=order as usize {
            degrees.extend(std::iter::repeat(n).take(2 * n - 1));
        }
    }
    degrees
}

/// FuMa weights of a unit direction, written into `weights` in channel order.
///
/// In two dimensions `z` is ignored and the height channels are omitted.
pub(crate) fn fuma_weights(weights: &mut [f32], dims: Dimensions, order: u8, x: f32, y: f32, z: f32) {
    let mut w = weights.iter_mut();
    let mut put = |v: f32| {
        if let Some(slot) = w.next() {
            *slot = v;
        }
    };

    put(FRAC_1_SQRT_2);
    if order == 0 {
        return;
    }
    let x2 = x * x;
    let y2 = y * y;
    put(x);
    put(y);
    if order > 1 {
        put(x2 - y2);
        put(2.0 * x * y);
        if order > 2 {
            put(x * (x2 - 3.0 * y2));
            put(y * (y2 - 3.0 * x2));
        }
    }
    if dims == Dimensions::Three {
        let z2 = z * z;
        put(z);
        if order > 1 {
            put(2.0 * z * x);
            put(2.0 * z * y);
            put(1.5 * z2 - 0.5);
            if order > 2 {
                let pre = 40.0 / 11.0 * z2 - 8.0 / 11.0;
                put(z * (x2 - y2) * 0.5);
                put(x * y * z);
                put(pre * x);
                put(pre * y);
                put(z * (2.5 * z2 - 1.5));
            }
        }
    }
}

/// Turns a direction into per-channel B-format weights and accumulates
/// weighted samples into a channel-major Ambisonic buffer.
#[derive(Debug, Clone)]
pub struct AmbiEncoder {
    dims: Dimensions,
    order: u8,
    weights: Vec<f32>,
}

impl AmbiEncoder {
    pub fn new(dims: Dimensions, order: u8) -> Result<Self> {
        check(dims, order)?;
        let mut encoder = Self {
            dims,
            order,
            weights: vec![0.0; channels_for(dims, order)],
        };
        encoder.set_direction(&Vec3::x());
        Ok(encoder)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn channels(&self) -> usize {
        self.weights.len()
    }

    /// Current channel weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Point the encoder at `direction` (any length). A zero vector has no
    /// directional part and feeds `W`, plus the constant term of `R` when
    /// encoding height at second order or above.
    #[inline]
    pub fn set_direction(&mut self, direction: &Vec3) {
        let unit = direction.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
        let z = match self.dims {
            Dimensions::Two => 0.0,
            Dimensions::Three => unit.z as f32,
        };
        fuma_weights(&mut self.weights, self.dims, self.order, unit.x as f32, unit.y as f32, z);
    }

    /// Point the encoder at an azimuth/elevation in degrees.
    pub fn set_direction_degrees(&mut self, azimuth: f64, elevation: f64) {
        self.set_direction(&direction_from_degrees(azimuth, elevation));
    }

    /// Add `sample`, weighted per channel, into frame `frame` of `ambi`, whose
    /// channels are `stride` frames apart.
    #[inline]
    pub fn encode(&self, ambi: &mut [f32], stride: usize, frame: usize, sample: f32) {
        if frame >= stride {
            return;
        }
        for (c, &w) in self.weights.iter().enumerate() {
            if let Some(slot) = ambi.get_mut(c * stride + frame) {
                *slot += w * sample;
            }
        }
    }
}
