//! Crossover whose low and high bands sum to an allpass.

use std::f64::consts::PI;

const DENORMAL_OFFSET: f64 = f64::EPSILON * 2.0;

/// Splits a signal into low and high shelves around a crossover frequency.
///
/// `lo + hi` equals a first-order allpass of the input, so the bands can be
/// processed separately (e.g. decoded with different Ambisonic flavors) and
/// summed without comb filtering.
#[derive(Debug, Clone)]
pub struct Crossover {
    c0: f64,
    c1: f64,
    z0: f64,
    z1: f64,
    z2: f64,
}

impl Crossover {
    pub fn new(freq: f64, sample_rate: f64) -> Self {
        let mut xo = Self {
            c0: 0.0,
            c1: 0.0,
            z0: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        xo.set_freq(freq, sample_rate);
        xo
    }

    pub fn set_freq(&mut self, freq: f64, sample_rate: f64) {
        let rad = 2.0 * PI * freq / sample_rate;
        let (sine, cosine) = rad.sin_cos();
        self.c0 = if cosine.abs() > 1e-4 {
            (sine - 1.0) / cosine
        } else {
            cosine * 0.5
        };
        self.c1 = (1.0 + self.c0) * 0.5;
    }

    /// Process one sample, returning `(lo, hi)`.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let input = input as f64;
        let v0 = input - self.c0 * self.z0;
        let x0 = self.z0 + self.c0 * v0;
        let v1 = self.c1 * (input - self.z1);
        let x1 = v1 + self.z1;
        let v2 = self.c1 * (x1 - self.z2);
        let x2 = v2 + self.z2;
        self.z0 = v0 + DENORMAL_OFFSET;
        self.z1 = v1 + x1 + DENORMAL_OFFSET;
        self.z2 = v2 + x2 + DENORMAL_OFFSET;
        (x2 as f32, (x0 - x2) as f32)
    }

    pub fn clear(&mut self) {
        self.z0 = 0.0;
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl Default for Crossover {
    fn default() -> Self {
        Self::new(600.0, 44100.0)
    }
}
