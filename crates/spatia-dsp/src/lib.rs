//! Real-time DSP building blocks for spatial rendering.
//!
//! Nothing here allocates after construction; every `process`/`read` method is
//! safe to call from an audio callback.
//!
//! - [`DelayLine`]: ring buffer with cubic fractional reads (propagation delay, Doppler)
//! - [`Biquad`] / [`BiquadCascade`]: RBJ cookbook filters
//! - [`Crossover`]: low/high shelf pair whose bands sum to an allpass
//! - [`Reverb`]: Dattorro plate reverb
//! - [`DistanceAttenuation`]: near/far clip attenuation laws

pub mod error;
pub use error::{Error, Result};

pub mod interp;

mod delay_line;
pub use delay_line::DelayLine;

mod biquad;
pub use biquad::{Biquad, BiquadCascade, BiquadKind};

mod crossover;
pub use crossover::Crossover;

mod reverb;
pub use reverb::Reverb;

mod attenuation;
pub use attenuation::{AttenuationLaw, DistanceAttenuation};
