//! Scene-level rendering through a stereo panner.
//!
//! Run with:
//! ```bash
//! cargo test -p spatia --test scene_stereo
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::*;
use spatia::prelude::*;
use spatia::{AttenuationLaw, DistanceAttenuation, SceneConfig};
use std::f32::consts::FRAC_1_SQRT_2;

fn stereo_scene() -> AudioScene {
    scene_with(StereoPanner::new(Arc::new(SpeakerLayout::stereo())).expect("stereo layout"))
}

// =============================================================================
// Panning
// =============================================================================

/// Constant power across the whole frontal arc.
#[test]
fn test_pan_sweep_is_constant_power() {
    for az in (-90..=90).step_by(15) {
        let mut scene = stereo_scene();
        let id = scene.create_source(dry_source_at(az as f64, 0.0)).unwrap();
        let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
        assert_abs_diff_eq!(frame_power(&out, 10), 1.0, epsilon = DSP_EPSILON);
    }
}

#[test]
fn test_left_source_is_louder_on_left() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source_at(45.0, 0.0)).unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    assert!(out[0][0] > out[1][0]);
}

#[test]
fn test_source_above_is_centered() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(0.0, 0.0, 3.0)).unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    assert_abs_diff_eq!(out[0][0], FRAC_1_SQRT_2, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(out[1][0], FRAC_1_SQRT_2, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_headset_routes_left_ear_to_channel_zero() {
    let mut scene =
        scene_with(StereoPanner::new(Arc::new(SpeakerLayout::headset())).expect("headset"));
    let id = scene.create_source(dry_source(0.0, 2.0, 0.0)).unwrap();
    let out = render_block(&mut scene, id, &[0.5; TEST_BLOCK_SIZE], 2);
    assert_abs_diff_eq!(out[0][3], 0.5, epsilon = FLOAT_EPSILON);
    assert_silence(&out[1], SILENCE_THRESHOLD);
}

// =============================================================================
// Listener motion
// =============================================================================

/// Turning the listener half a circle swaps the channels.
#[test]
fn test_listener_turn_swaps_channels() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(1.0, 1.0, 0.0)).unwrap();
    let before = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);

    let (lid, _) = scene.listeners().next().unwrap();
    scene
        .listener(lid)
        .unwrap()
        .pose()
        .set_orientation(Quat::from_axis_angle(&Vec3::z_axis(), std::f64::consts::PI));
    let after = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);

    assert_abs_diff_eq!(before[0][0], after[1][0], epsilon = DSP_EPSILON);
    assert_abs_diff_eq!(before[1][0], after[0][0], epsilon = DSP_EPSILON);
}

/// Moving the listener next to the source is the same as moving the source.
#[test]
fn test_listener_translation_is_relative() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(5.0, 5.0, 0.0)).unwrap();
    let (lid, _) = scene.listeners().next().unwrap();
    scene.listener(lid).unwrap().pose().set_position(5.0, 6.0, 0.0);
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    // source now sits one meter to the listener's right
    assert_silence(&out[0], SILENCE_THRESHOLD);
    assert_abs_diff_eq!(out[1][0], 1.0, epsilon = FLOAT_EPSILON);
}

// =============================================================================
// Propagation and attenuation
// =============================================================================

#[test]
fn test_impulse_arrives_after_propagation_delay() {
    let mut scene = stereo_scene();
    let id = scene
        .create_source(
            SoundSource::builder()
                .position(2.5, 0.0, 0.0)
                .use_attenuation(false),
        )
        .unwrap();

    let signal = generate_impulse(TEST_BLOCK_SIZE * 8, 0);
    let out = render_stream(&mut scene, id, &signal, 2);
    let expected = 2 * SAMPLES_PER_METER + SAMPLES_PER_METER / 2;
    assert_eq!(peak_index(&out[0]), expected);
    assert_abs_diff_eq!(out[0][expected], FRAC_1_SQRT_2, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_inverse_attenuation_follows_law() {
    let law = DistanceAttenuation::new(1.0, 50.0, AttenuationLaw::Inverse, 0.0).unwrap();
    let level = |x: f64| {
        let mut scene = stereo_scene();
        let id = scene
            .create_source(
                SoundSource::builder()
                    .position(x, 0.0, 0.0)
                    .doppler(DopplerType::None)
                    .near_clip(1.0)
                    .far_clip(50.0)
                    .attenuation_law(AttenuationLaw::Inverse),
            )
            .unwrap();
        render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2)[0][0]
    };
    for x in [2.0, 4.0, 10.0, 50.0] {
        assert_abs_diff_eq!(level(x), FRAC_1_SQRT_2 * law.gain(x) as f32, epsilon = FLOAT_EPSILON);
    }
    assert!(level(4.0) < level(2.0));
    // far clip holds a quarter of the near level
    assert_abs_diff_eq!(level(80.0), FRAC_1_SQRT_2 * 0.25, epsilon = FLOAT_EPSILON);
}

/// A source built on its own still reaches the listener in a 96 kHz scene.
#[test]
fn test_added_source_follows_scene_sample_rate() {
    let config = SceneConfig {
        sample_rate: 96000.0,
        num_frames: 1024,
        speed_of_sound: TEST_SPEED_OF_SOUND,
    };
    let mut scene = AudioScene::new(config.clone()).unwrap();
    scene
        .create_listener(StereoPanner::new(Arc::new(SpeakerLayout::stereo())).expect("stereo layout"))
        .unwrap();

    let source = SoundSource::builder()
        .position(60.0, 0.0, 0.0)
        .far_clip(100.0)
        .build()
        .unwrap();
    assert!(source.max_delay() < 60.0 * config.samples_per_meter());
    let id = scene.add_source(source).unwrap();

    let mut loudest = 0.0f32;
    for _ in 0..24 {
        let out = render_block(&mut scene, id, &[1.0; 1024], 2);
        loudest = loudest.max(peak(&out[0]));
    }
    assert!(loudest > 0.1, "peak {loudest}");
}

#[test]
fn test_inside_near_clip_is_full_level() {
    let mut scene = stereo_scene();
    let id = scene
        .create_source(
            SoundSource::builder()
                .position(0.5, 0.0, 0.0)
                .doppler(DopplerType::None)
                .near_clip(1.0)
                .attenuation_law(AttenuationLaw::InverseSquare),
        )
        .unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    assert_abs_diff_eq!(out[0][0], FRAC_1_SQRT_2, epsilon = FLOAT_EPSILON);
}

// =============================================================================
// Scene plumbing
// =============================================================================

#[test]
fn test_render_accumulates_into_output() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(1.0, 0.0, 0.0)).unwrap();
    scene.write_source(id, &[1.0; TEST_BLOCK_SIZE]).unwrap();

    let mut data = vec![1.0f32; 2 * TEST_BLOCK_SIZE];
    let mut out = OutputBlock::new(&mut data, TEST_BLOCK_SIZE);
    scene.render(&mut out);
    assert_abs_diff_eq!(out.get(0, 0), 1.0 + FRAC_1_SQRT_2, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_no_sources_renders_silence() {
    let mut scene = stereo_scene();
    let out = render_silent_sources(&mut scene, TEST_BLOCK_SIZE, 2);
    assert_silence(&out[0], SILENCE_THRESHOLD);
    assert_silence(&out[1], SILENCE_THRESHOLD);
}

#[test]
fn test_moving_source_handle_from_another_thread() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(1.0, 1.0, 0.0)).unwrap();
    let handle = scene.source(id).unwrap().handle();

    std::thread::spawn(move || handle.set_position(1.0, -1.0, 0.0))
        .join()
        .unwrap();

    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    assert!(out[1][0] > out[0][0]);
}

#[test]
fn test_noise_keeps_channel_energy_balanced_when_centered() {
    let mut scene = stereo_scene();
    let id = scene.create_source(dry_source(3.0, 0.0, 0.0)).unwrap();
    let noise = generate_noise(TEST_BLOCK_SIZE * 4, 7);
    let out = render_stream(&mut scene, id, &noise, 2);
    assert_has_audio(&out[0], 0.1);
    assert_abs_diff_eq!(rms(&out[0]), rms(&out[1]), epsilon = PERCEPTUAL_EPSILON);
}
