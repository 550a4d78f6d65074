//! # 02 - Ambisonic Dome
//!
//! Two sources rendered through first-order Ambisonics onto a cube of eight
//! speakers, decoded in two bands (max-rE above 400 Hz, in-phase below). One
//! source climbs from the floor to overhead while the other stays put.
//!
//! **Concepts:** `AmbisonicsSpatializer`, dual-band decoding, height
//!
//! ```bash
//! cargo run --example 02_ambisonic_dome
//! ```

use spatia::prelude::*;

const SAMPLE_RATE: f64 = 44100.0;
const FRAMES: usize = 512;

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len().max(1) as f32).sqrt()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut scene = AudioScene::builder()
        .sample_rate(SAMPLE_RATE)
        .num_frames(FRAMES)
        .build()?;

    let layout = Arc::new(SpeakerLayout::cube());
    let channels = layout.num_output_channels();
    let ambi = AmbisonicsSpatializer::new(layout.clone(), Dimensions::Three, 1)?
        .with_dual_band(AmbiFlavor::InPhase, AmbiFlavor::MaxRe, 400.0)?;
    scene.create_listener(ambi)?;

    let climber = scene.create_source(
        SoundSource::builder()
            .position(2.0, 0.0, -1.0)
            .doppler(DopplerType::None),
    )?;
    let drone = scene.create_source(
        SoundSource::builder()
            .position(-2.0, 2.0, 0.0)
            .gain(0.3)
            .doppler(DopplerType::None),
    )?;
    let climber_handle = scene.source(climber).map(|s| s.handle()).ok_or("source vanished")?;

    let noise: Vec<f32> = (0..FRAMES)
        .map(|i| ((i as f32 * 12.9898).sin() * 43758.547).fract() - 0.5)
        .collect();
    let mut data = vec![0.0f32; channels * FRAMES];

    for step in 0..=8 {
        let z = -1.0 + step as f64 * 0.5;
        climber_handle.set_position(2.0 * (1.0 - step as f64 / 8.0), 0.0, z);

        scene.write_source(climber, &noise)?;
        scene.write_source(drone, &noise)?;
        let mut out = OutputBlock::new(&mut data, FRAMES);
        out.clear();
        scene.render(&mut out);

        let lower: f32 = (0..4).map(|i| rms(out.channel(i))).sum();
        let upper: f32 = (4..8).map(|i| rms(out.channel(i))).sum();
        println!("height {z:+.1} m: lower ring {lower:.3}, upper ring {upper:.3}");
    }
    Ok(())
}
