//! Distance-based amplitude panning.
//!
//! Run with:
//! ```bash
//! cargo test -p spatia --test dbap
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::*;
use spatia::prelude::*;

fn expected_gain(distance: f32, coefficient: f32, spread: f32) -> f32 {
    (1.0 / (1.0 + coefficient * distance)).powf(spread)
}

#[test]
fn test_speaker_in_source_direction_gets_unity() {
    let mut scene = scene_with(Dbap::new(Arc::new(SpeakerLayout::octal())));
    let id = scene.create_source(dry_source_at(90.0, 0.0)).unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 8);
    assert_abs_diff_eq!(out[2][0], 1.0, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_gains_follow_chord_distance() {
    let mut scene = scene_with(Dbap::new(Arc::new(SpeakerLayout::octal())));
    let id = scene.create_source(dry_source_at(0.0, 0.0)).unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 8);
    for (k, ch) in out.iter().enumerate() {
        let angle = (45.0 * k as f32).to_radians();
        let chord = 2.0 * (angle / 2.0).sin();
        assert_abs_diff_eq!(ch[0], expected_gain(chord, 1.0, 1.0), epsilon = DSP_EPSILON);
    }
    // opposite speaker is two units away
    assert_abs_diff_eq!(out[4][0], 1.0 / 3.0, epsilon = DSP_EPSILON);
}

#[test]
fn test_spread_narrows_the_image() {
    let level_behind = |spread: f32| {
        let dbap = Dbap::new(Arc::new(SpeakerLayout::octal()))
            .with_spread(spread)
            .unwrap();
        let mut scene = scene_with(dbap);
        let id = scene.create_source(dry_source_at(0.0, 0.0)).unwrap();
        render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 8)[4][0]
    };
    assert!(level_behind(4.0) < level_behind(1.0));
    assert_abs_diff_eq!(level_behind(2.0), 1.0 / 9.0, epsilon = DSP_EPSILON);
}

#[test]
fn test_zero_coefficient_is_omnidirectional() {
    let dbap = Dbap::new(Arc::new(SpeakerLayout::cube()))
        .with_coefficient(0.0)
        .unwrap();
    let mut scene = scene_with(dbap);
    let id = scene.create_source(dry_source(1.0, -2.0, 0.5)).unwrap();
    let out = render_block(&mut scene, id, &[0.5; TEST_BLOCK_SIZE], 8);
    for ch in &out {
        assert_abs_diff_eq!(ch[9], 0.5, epsilon = FLOAT_EPSILON);
    }
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let layout = Arc::new(SpeakerLayout::octal());
    assert!(Dbap::new(layout.clone()).with_spread(0.0).is_err());
    assert!(Dbap::new(layout.clone()).with_spread(f32::NAN).is_err());
    assert!(Dbap::new(layout.clone()).with_coefficient(-1.0).is_err());

    let mut dbap = Dbap::new(layout);
    assert!(dbap.set_spread(2.5).is_ok());
    assert_eq!(dbap.spread(), 2.5);
}

/// Works on layouts VBAP cannot triangulate.
#[test]
fn test_sparse_layout_still_renders() {
    let layout = Arc::new(
        SpeakerLayout::new(vec![Speaker::new(0, 10.0, 0.0), Speaker::new(1, 20.0, 0.0)]).unwrap(),
    );
    let mut scene = scene_with(Dbap::new(layout));
    let id = scene.create_source(dry_source_at(180.0, 0.0)).unwrap();
    let out = render_block(&mut scene, id, &[1.0; TEST_BLOCK_SIZE], 2);
    assert_has_audio(&out[0], 0.1);
    assert_has_audio(&out[1], 0.1);
}

#[test]
fn test_per_sample_and_per_buffer_agree() {
    let render = |mode: ProcessingMode| {
        let mut scene = scene_with(Dbap::new(Arc::new(SpeakerLayout::octal())));
        let id = scene
            .create_source(dry_source(2.0, 1.0, 0.0).processing_mode(mode))
            .unwrap();
        let noise = generate_noise(TEST_BLOCK_SIZE * 3, 11);
        render_stream(&mut scene, id, &noise, 8)
    };
    let a = render(ProcessingMode::PerSample);
    let b = render(ProcessingMode::PerBuffer);
    for (x, y) in a.iter().zip(&b) {
        for (p, q) in x.iter().zip(y) {
            assert_abs_diff_eq!(p, q, epsilon = DSP_EPSILON);
        }
    }
}
