//! Test helpers and fixtures for spatia integration tests
//!
//! Scenes are rendered offline, block by block, with no audio device.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (unity gain, plain panning)
//! - `DSP_EPSILON` (1e-4): DSP processing (interpolation, decoding)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use spatia::prelude::*;
use spatia::{SoundSourceBuilder, SourceId, Spatializer};

/// Sample rate giving exactly 100 samples of delay per meter at
/// [`TEST_SPEED_OF_SOUND`].
pub const TEST_SAMPLE_RATE: f64 = 34400.0;

pub const TEST_SPEED_OF_SOUND: f64 = 344.0;

/// Samples of propagation delay per meter in a [`test_scene`].
pub const SAMPLES_PER_METER: usize = 100;

/// Block size for deterministic testing.
pub const TEST_BLOCK_SIZE: usize = 64;

/// Create a scene with no listeners or sources.
pub fn test_scene() -> AudioScene {
    AudioScene::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .num_frames(TEST_BLOCK_SIZE)
        .speed_of_sound(TEST_SPEED_OF_SOUND)
        .build()
        .expect("Failed to create test scene")
}

/// Create a scene with one listener using `spatializer`.
pub fn scene_with<S: Spatializer + 'static>(spatializer: S) -> AudioScene {
    let mut scene = test_scene();
    scene
        .create_listener(spatializer)
        .expect("Failed to create listener");
    scene
}

/// Source with no propagation delay and no distance attenuation, so the
/// output is pure panning.
pub fn dry_source(x: f64, y: f64, z: f64) -> SoundSourceBuilder {
    SoundSource::builder()
        .position(x, y, z)
        .doppler(DopplerType::None)
        .use_attenuation(false)
}

/// Source at `azimuth` / `elevation` degrees, one meter away, dry.
pub fn dry_source_at(azimuth: f64, elevation: f64) -> SoundSourceBuilder {
    let d = spatia::direction_from_degrees(azimuth, elevation);
    dry_source(d.x, d.y, d.z)
}

/// Write `input` to `source`, render one block into a fresh buffer and
/// return it channel by channel.
pub fn render_block(
    scene: &mut AudioScene,
    source: SourceId,
    input: &[f32],
    channels: usize,
) -> Vec<Vec<f32>> {
    scene
        .write_source(source, input)
        .expect("Failed to write source");
    render_silent_sources(scene, input.len(), channels)
}

/// Render one block without writing any source.
pub fn render_silent_sources(scene: &mut AudioScene, frames: usize, channels: usize) -> Vec<Vec<f32>> {
    let mut data = vec![0.0f32; channels * frames];
    let mut out = OutputBlock::new(&mut data, frames);
    scene.render(&mut out);
    data.chunks(frames).map(|c| c.to_vec()).collect()
}

/// Render `signal` block by block, concatenated per channel.
pub fn render_stream(
    scene: &mut AudioScene,
    source: SourceId,
    signal: &[f32],
    channels: usize,
) -> Vec<Vec<f32>> {
    let mut result = vec![Vec::with_capacity(signal.len()); channels];
    for block in signal.chunks(TEST_BLOCK_SIZE) {
        let rendered = render_block(scene, source, block, channels);
        for (acc, ch) in result.iter_mut().zip(rendered) {
            acc.extend(ch);
        }
    }
    result
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate a unit impulse at `position`.
pub fn generate_impulse(num_samples: usize, position: usize) -> Vec<f32> {
    let mut v = vec![0.0; num_samples];
    if position < num_samples {
        v[position] = 1.0;
    }
    v
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Index of the loudest sample.
pub fn peak_index(samples: &[f32]) -> usize {
    samples
        .iter()
        .enumerate()
        .fold((0, 0.0_f32), |(bi, bv), (i, &v)| {
            if v.abs() > bv {
                (i, v.abs())
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Frequency estimate from rising zero crossings.
pub fn zero_crossing_frequency(samples: &[f32], sample_rate: f64) -> f64 {
    let crossings = samples
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
        .count();
    crossings as f64 * sample_rate / samples.len() as f64
}

/// Sum of squares across channels at one frame.
pub fn frame_power(channels: &[Vec<f32>], frame: usize) -> f32 {
    channels.iter().map(|c| c[frame] * c[frame]).sum()
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}
