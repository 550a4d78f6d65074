//! Plate reverb after Dattorro's figure-eight tank.

/// Fixed-size ring used by the reverb network.
///
/// Unlike [`crate::DelayLine`], taps are addressed from the write cursor
/// (`tap(0)` is the slot about to be overwritten), which is how the output tap
/// table below is expressed.
#[derive(Debug, Clone)]
struct PlateDelay {
    buf: Vec<f32>,
    pos: usize,
}

impl PlateDelay {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len],
            pos: 0,
        }
    }

    #[inline]
    fn tap(&self, i: usize) -> f32 {
        let len = self.buf.len();
        self.buf[(self.pos + len - i % len) % len]
    }

    #[inline]
    fn write(&mut self, v: f32) {
        self.buf[self.pos] = v;
        self.pos += 1;
        if self.pos == self.buf.len() {
            self.pos = 0;
        }
    }

    #[inline]
    fn back(&self) -> f32 {
        self.buf[(self.pos + 1) % self.buf.len()]
    }

    /// Plain delay: returns the oldest sample and stores `v`.
    #[inline]
    fn shift(&mut self, v: f32) -> f32 {
        let out = self.buf[self.pos];
        self.write(v);
        out
    }

    /// Feedback/feedforward comb; an allpass when `ffd == -fbk`.
    #[inline]
    fn comb(&mut self, v: f32, ffd: f32, fbk: f32) -> f32 {
        let d = self.buf[self.pos];
        let r = v + d * fbk;
        self.write(r);
        d + r * ffd
    }

    fn clear(&mut self) {
        self.buf.fill(0.0);
        self.pos = 0;
    }
}

#[derive(Debug, Clone, Default)]
struct OnePole {
    state: f32,
    coeff: f32,
}

impl OnePole {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.state = (self.state - input) * self.coeff + input;
        self.state
    }
}

/// Mono-in, stereo-out plate reverb.
#[derive(Debug, Clone)]
pub struct Reverb {
    diffusion_in1: f32,
    diffusion_in2: f32,
    diffusion_decay1: f32,
    diffusion_decay2: f32,
    decay: f32,

    pre_delay: PlateDelay,
    input_filter: OnePole,
    ap_in: [PlateDelay; 4],

    ap_decay11: PlateDelay,
    ap_decay12: PlateDelay,
    dly11: PlateDelay,
    dly12: PlateDelay,
    damp1: OnePole,

    ap_decay21: PlateDelay,
    ap_decay22: PlateDelay,
    dly21: PlateDelay,
    dly22: PlateDelay,
    damp2: OnePole,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Reverb {
    /// Default output gain of [`Reverb::process`].
    pub const DEFAULT_GAIN: f32 = 0.6;

    pub fn new() -> Self {
        let mut reverb = Self {
            diffusion_in1: 0.0,
            diffusion_in2: 0.0,
            diffusion_decay1: 0.0,
            diffusion_decay2: 0.0,
            decay: 0.0,
            pre_delay: PlateDelay::new(10),
            input_filter: OnePole::default(),
            ap_in: [
                PlateDelay::new(142),
                PlateDelay::new(107),
                PlateDelay::new(379),
                PlateDelay::new(277),
            ],
            ap_decay11: PlateDelay::new(672),
            ap_decay12: PlateDelay::new(1800),
            dly11: PlateDelay::new(4453),
            dly12: PlateDelay::new(3720),
            damp1: OnePole::default(),
            ap_decay21: PlateDelay::new(908),
            ap_decay22: PlateDelay::new(2656),
            dly21: PlateDelay::new(4217),
            dly22: PlateDelay::new(3163),
            damp2: OnePole::default(),
        };
        reverb.set_bandwidth(0.9995);
        reverb.set_decay(0.85);
        reverb.set_damping(0.4);
        reverb.set_diffusion(0.76, 0.666, 0.707, 0.571);
        reverb
    }

    /// Input low-pass amount in (0, 1]; 1 passes everything.
    pub fn set_bandwidth(&mut self, bandwidth: f32) -> &mut Self {
        self.input_filter.coeff = 1.0 - bandwidth;
        self
    }

    /// High-frequency damping inside the tank, in [0, 1).
    pub fn set_damping(&mut self, damping: f32) -> &mut Self {
        self.damp1.coeff = damping;
        self.damp2.coeff = damping;
        self
    }

    /// Tank feedback, in [0, 1).
    pub fn set_decay(&mut self, decay: f32) -> &mut Self {
        self.decay = decay;
        self
    }

    pub fn set_diffusion(&mut self, in1: f32, in2: f32, decay1: f32, decay2: f32) -> &mut Self {
        self.diffusion_in1 = in1;
        self.diffusion_in2 = in2;
        self.diffusion_decay1 = decay1;
        self.diffusion_decay2 = decay2;
        self
    }

    /// Wet stereo output for one input sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        self.process_with_gain(input, Self::DEFAULT_GAIN)
    }

    pub fn process_with_gain(&mut self, input: f32, gain: f32) -> (f32, f32) {
        let (din1, din2) = (self.diffusion_in1, self.diffusion_in2);
        let (dd1, dd2) = (self.diffusion_decay1, self.diffusion_decay2);

        let mut v = self.pre_delay.shift(input * 0.5);
        v = self.input_filter.process(v);
        v = self.ap_in[0].comb(v, din1, -din1);
        v = self.ap_in[1].comb(v, din1, -din1);
        v = self.ap_in[2].comb(v, din2, -din2);
        v = self.ap_in[3].comb(v, din2, -din2);

        let mut a = v + self.dly22.back() * self.decay;
        let mut b = v + self.dly12.back() * self.decay;

        a = self.ap_decay11.comb(a, -dd1, dd1);
        a = self.dly11.shift(a);
        a = self.damp1.process(a) * self.decay;
        a = self.ap_decay12.comb(a, dd2, -dd2);
        self.dly12.write(a);

        b = self.ap_decay21.comb(b, -dd1, dd1);
        b = self.dly21.shift(b);
        b = self.damp2.process(b) * self.decay;
        b = self.ap_decay22.comb(b, dd2, -dd2);
        self.dly22.write(b);

        let left = self.dly21.tap(266) + self.dly21.tap(2974) - self.ap_decay22.tap(1913)
            + self.dly22.tap(1996)
            - self.dly11.tap(1990)
            - self.ap_decay12.tap(187)
            - self.dly12.tap(1066);
        let right = self.dly11.tap(353) + self.dly11.tap(3627) - self.ap_decay12.tap(1228)
            + self.dly12.tap(2673)
            - self.dly21.tap(2111)
            - self.ap_decay22.tap(335)
            - self.dly22.tap(121);
        (left * gain, right * gain)
    }

    /// Dry input plus `wet` amount of reverb.
    pub fn mix(&mut self, input: f32, wet: f32) -> (f32, f32) {
        let (l, r) = self.process_with_gain(input, wet * Self::DEFAULT_GAIN);
        (l + input, r + input)
    }

    pub fn clear(&mut self) {
        self.pre_delay.clear();
        for ap in &mut self.ap_in {
            ap.clear();
        }
        for d in [
            &mut self.ap_decay11,
            &mut self.ap_decay12,
            &mut self.dly11,
            &mut self.dly12,
            &mut self.ap_decay21,
            &mut self.ap_decay22,
            &mut self.dly21,
            &mut self.dly22,
        ] {
            d.clear();
        }
        self.input_filter.state = 0.0;
        self.damp1.state = 0.0;
        self.damp2.state = 0.0;
    }
}
