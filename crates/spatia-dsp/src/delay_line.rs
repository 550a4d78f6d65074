//! Fixed-capacity delay line with fractional reads.

use crate::interp::cubic;
use crate::{Error, Result};

/// Ring buffer of past samples, one per sound source.
///
/// Delays are counted from the most recent write: `read(0)` is the last
/// sample written, `read(1)` the one before it. Fractional reads use four-point
/// cubic interpolation around the requested position and are only meaningful up
/// to [`DelayLine::max_delay`].
///
/// Single writer, single reader; the buffer is sized once and never resized on
/// the audio thread.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Smallest capacity that leaves room for a cubic read.
    pub const MIN_CAPACITY: usize = 4;

    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < Self::MIN_CAPACITY {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest delay a fractional read accepts.
    #[inline]
    pub fn max_delay(&self) -> f64 {
        (self.buffer.len() - 2) as f64
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    pub fn write_slice(&mut self, samples: &[f32]) {
        for &s in samples {
            self.write(s);
        }
    }

    /// Sample written `delay` writes ago. Delays past the capacity are clamped
    /// to the oldest stored sample.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        let idx = (self.write_pos + len - 1 - delay) % len;
        self.buffer[idx]
    }

    /// Cubic-interpolated read at a fractional delay.
    ///
    /// Integer delays return the stored sample exactly. Negative delays read
    /// the most recent sample; delays past [`DelayLine::max_delay`] are clamped.
    #[inline]
    pub fn read_by_delay(&self, delay: f64) -> f32 {
        let delay = delay.clamp(0.0, self.max_delay());
        let whole = delay.floor();
        let frac = (delay - whole) as f32;
        let d = whole as usize;
        if frac == 0.0 {
            return self.read(d);
        }
        // newer neighbor of delay 0 does not exist yet; repeat the newest sample
        let newer = self.read(d.saturating_sub(1));
        cubic(frac, newer, self.read(d), self.read(d + 1), self.read(d + 2))
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
