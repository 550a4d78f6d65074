//! Propagation delay and Doppler shift of moving sources.
//!
//! Run with:
//! ```bash
//! cargo test -p spatia --test doppler
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::*;
use spatia::prelude::*;
use spatia::SceneConfig;

fn headset_scene() -> AudioScene {
    scene_with(StereoPanner::new(Arc::new(SpeakerLayout::headset())).expect("headset"))
}

fn config() -> SceneConfig {
    SceneConfig {
        sample_rate: TEST_SAMPLE_RATE,
        num_frames: TEST_BLOCK_SIZE,
        speed_of_sound: TEST_SPEED_OF_SOUND,
    }
}

/// Drive a source away from (or toward) the listener at `velocity` m/s,
/// playing `tone`, and return the left ear signal.
fn fly_by(doppler: DopplerType, start: f64, velocity: f64, tone: f64, seconds: f64) -> Vec<f32> {
    let mut scene = headset_scene();
    let id = scene
        .create_source(
            SoundSource::builder()
                .position(0.0, start, 0.0)
                .doppler(doppler)
                .processing_mode(ProcessingMode::PerSample)
                .use_attenuation(false)
                .delay_capacity(16384),
        )
        .unwrap();
    let handle = scene.source(id).unwrap().handle();

    let total = (seconds * TEST_SAMPLE_RATE) as usize / TEST_BLOCK_SIZE * TEST_BLOCK_SIZE;
    let signal = generate_sine(tone, TEST_SAMPLE_RATE, total);
    let mut left = Vec::with_capacity(total);
    for (b, block) in signal.chunks(TEST_BLOCK_SIZE).enumerate() {
        let t = (b * TEST_BLOCK_SIZE) as f64 / TEST_SAMPLE_RATE;
        handle.set_position(0.0, start + velocity * t, 0.0);
        let out = render_block(&mut scene, id, block, 2);
        left.extend_from_slice(&out[0]);
    }
    left
}

// =============================================================================
// Delay models
// =============================================================================

#[test]
fn test_no_doppler_has_no_latency() {
    let mut scene = headset_scene();
    let id = scene
        .create_source(
            SoundSource::builder()
                .position(0.0, 10.0, 0.0)
                .doppler(DopplerType::None)
                .use_attenuation(false),
        )
        .unwrap();
    let impulse = generate_impulse(TEST_BLOCK_SIZE, 5);
    let out = render_block(&mut scene, id, &impulse, 2);
    assert_eq!(peak_index(&out[0]), 5);
    assert_abs_diff_eq!(out[0][5], 1.0, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_physical_matches_symmetric_when_static() {
    let render = |doppler: DopplerType| {
        let mut scene = headset_scene();
        let id = scene
            .create_source(
                SoundSource::builder()
                    .position(0.0, 1.3, 0.0)
                    .doppler(doppler)
                    .use_attenuation(false),
            )
            .unwrap();
        let noise = generate_noise(TEST_BLOCK_SIZE * 4, 3);
        render_stream(&mut scene, id, &noise, 2)
    };
    let a = render(DopplerType::Symmetric);
    let b = render(DopplerType::Physical);
    for (x, y) in a[0].iter().zip(&b[0]) {
        assert_abs_diff_eq!(x, y, epsilon = FLOAT_EPSILON);
    }
}

#[test]
fn test_samples_per_meter_per_model() {
    let config = config();
    let source = |doppler: DopplerType| SoundSource::builder().doppler(doppler).build_for(&config).unwrap();

    assert_eq!(source(DopplerType::None).samples_per_meter(&config, 50.0), 0.0);
    assert_abs_diff_eq!(
        source(DopplerType::Symmetric).samples_per_meter(&config, 50.0),
        SAMPLES_PER_METER as f64,
        epsilon = 1e-9
    );

    let physical = source(DopplerType::Physical);
    // receding shortens the delay per meter, approaching lengthens it
    assert!(physical.samples_per_meter(&config, 34.4) < SAMPLES_PER_METER as f64);
    assert!(physical.samples_per_meter(&config, -34.4) > SAMPLES_PER_METER as f64);
    // clamped at 0.9 c
    let c = TEST_SPEED_OF_SOUND;
    assert_abs_diff_eq!(
        physical.samples_per_meter(&config, -10.0 * c),
        TEST_SAMPLE_RATE / (0.1 * c),
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        physical.samples_per_meter(&config, 10.0 * c),
        TEST_SAMPLE_RATE / (1.9 * c),
        epsilon = 1e-6
    );
}

#[test]
fn test_source_moving_out_of_range_goes_silent() {
    let mut scene = headset_scene();
    let id = scene
        .create_source(
            SoundSource::builder()
                .position(0.0, 1.0, 0.0)
                .use_attenuation(false)
                .delay_capacity(512),
        )
        .unwrap();
    let handle = scene.source(id).unwrap().handle();
    let tone = generate_sine(500.0, TEST_SAMPLE_RATE, TEST_BLOCK_SIZE * 8);
    let before = render_stream(&mut scene, id, &tone, 2);
    assert_has_audio(&before[0][TEST_BLOCK_SIZE * 4..], 0.1);

    handle.set_position(0.0, 20.0, 0.0);
    let after = render_stream(&mut scene, id, &tone, 2);
    assert_silence(&after[0], SILENCE_THRESHOLD);
}

// =============================================================================
// Pitch shift
// =============================================================================

/// Receding at a tenth of the speed of sound lowers the pitch by a tenth.
#[test]
fn test_receding_source_is_lower_in_pitch() {
    let left = fly_by(DopplerType::Symmetric, 2.0, 34.4, 1000.0, 1.0);
    let settled = &left[left.len() / 4..];
    let heard = zero_crossing_frequency(settled, TEST_SAMPLE_RATE);
    assert!((heard - 900.0).abs() < 15.0, "heard {heard} Hz");
}

#[test]
fn test_approaching_source_is_higher_in_pitch() {
    let left = fly_by(DopplerType::Symmetric, 36.0, -34.4, 1000.0, 1.0);
    let settled = &left[left.len() / 2..];
    let heard = zero_crossing_frequency(settled, TEST_SAMPLE_RATE);
    assert!((heard - 1100.0).abs() < 15.0, "heard {heard} Hz");
}

#[test]
fn test_without_doppler_pitch_is_unchanged() {
    let left = fly_by(DopplerType::None, 2.0, 34.4, 1000.0, 1.0);
    let settled = &left[left.len() / 4..];
    let heard = zero_crossing_frequency(settled, TEST_SAMPLE_RATE);
    assert!((heard - 1000.0).abs() < 10.0, "heard {heard} Hz");
}
