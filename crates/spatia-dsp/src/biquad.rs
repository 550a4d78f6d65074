//! RBJ cookbook biquad filters.

use std::f32::consts::{LN_2, PI};

/// Filter response of a [`Biquad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    /// Peaking EQ
    Peak,
    LowShelf,
    HighShelf,
}

#[derive(Debug, Clone, Copy, Default)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

/// Second-order IIR filter (direct form I).
#[derive(Debug, Clone)]
pub struct Biquad {
    kind: BiquadKind,
    sample_rate: f32,
    freq: f32,
    bandwidth: f32,
    gain_db: f32,
    coeffs: Coefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Filter with its corner just below Nyquist, `bandwidth` 1.9 octaves, 0 dB.
    pub fn new(kind: BiquadKind, sample_rate: f32) -> Self {
        let mut filter = Self {
            kind,
            sample_rate,
            freq: 0.0,
            bandwidth: 1.9,
            gain_db: 0.0,
            coeffs: Coefficients::default(),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.set(sample_rate * 0.5, 1.9, 0.0);
        filter
    }

    pub fn kind(&self) -> BiquadKind {
        self.kind
    }

    /// Corner/center frequency after clamping.
    pub fn freq(&self) -> f32 {
        self.freq
    }

    /// Recompute coefficients. `bandwidth` is in octaves, `gain_db` only affects
    /// the peak and shelf responses. Frequency is clamped to 20 Hz..0.45·fs.
    pub fn set(&mut self, freq: f32, bandwidth: f32, gain_db: f32) {
        let freq = freq.clamp(20.0, self.sample_rate * 0.45);
        self.freq = freq;
        self.bandwidth = bandwidth;
        self.gain_db = gain_db;

        let a = 10.0_f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq / self.sample_rate;
        let (sn, cs) = omega.sin_cos();
        let alpha = sn * (LN_2 / 2.0 * bandwidth * omega / sn).sinh();
        let beta = (a + a).sqrt();

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            BiquadKind::LowPass => (
                (1.0 - cs) / 2.0,
                1.0 - cs,
                (1.0 - cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            BiquadKind::HighPass => (
                (1.0 + cs) / 2.0,
                -(1.0 + cs),
                (1.0 + cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
            BiquadKind::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cs, 1.0 - alpha),
            BiquadKind::Notch => (1.0, -2.0 * cs, 1.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha),
            BiquadKind::Peak => (
                1.0 + alpha * a,
                -2.0 * cs,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cs,
                1.0 - alpha / a,
            ),
            BiquadKind::LowShelf => (
                a * ((a + 1.0) - (a - 1.0) * cs + beta * sn),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cs),
                a * ((a + 1.0) - (a - 1.0) * cs - beta * sn),
                (a + 1.0) + (a - 1.0) * cs + beta * sn,
                -2.0 * ((a - 1.0) + (a + 1.0) * cs),
                (a + 1.0) + (a - 1.0) * cs - beta * sn,
            ),
            BiquadKind::HighShelf => (
                a * ((a + 1.0) + (a - 1.0) * cs + beta * sn),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cs),
                a * ((a + 1.0) + (a - 1.0) * cs - beta * sn),
                (a + 1.0) - (a - 1.0) * cs + beta * sn,
                2.0 * ((a - 1.0) - (a + 1.0) * cs),
                (a + 1.0) - (a - 1.0) * cs - beta * sn,
            ),
        };

        self.coeffs = Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set(self.freq, self.bandwidth, self.gain_db);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let out = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for s in buffer.iter_mut() {
            *s = self.process(*s);
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Identical biquads in series, for steeper slopes.
#[derive(Debug, Clone)]
pub struct BiquadCascade {
    stages: Vec<Biquad>,
}

impl BiquadCascade {
    pub fn new(stages: usize, kind: BiquadKind, sample_rate: f32) -> Self {
        Self {
            stages: (0..stages.max(1))
                .map(|_| Biquad::new(kind, sample_rate))
                .collect(),
        }
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn set(&mut self, freq: f32, bandwidth: f32, gain_db: f32) {
        for stage in &mut self.stages {
            stage.set(freq, bandwidth, gain_db);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for stage in &mut self.stages {
            stage.set_sample_rate(sample_rate);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.stages.iter_mut().fold(input, |s, stage| stage.process(s))
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for s in buffer.iter_mut() {
            *s = self.process(*s);
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
