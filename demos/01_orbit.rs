//! # 01 - Orbit
//!
//! A 440 Hz tone circles the listener on an eight-speaker ring, rendered
//! offline with VBAP and per-sample Doppler, and written to an 8-channel WAV.
//!
//! **Concepts:** `AudioScene`, `Vbap`, `SourceHandle`, per-sample processing
//!
//! ```bash
//! cargo run --example 01_orbit
//! ```

use hound::{SampleFormat, WavSpec, WavWriter};
use spatia::prelude::*;

const SAMPLE_RATE: f64 = 48000.0;
const FRAMES: usize = 256;
const SECONDS: f64 = 6.0;
const RADIUS: f64 = 4.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut scene = AudioScene::builder()
        .sample_rate(SAMPLE_RATE)
        .num_frames(FRAMES)
        .build()?;

    let layout = Arc::new(SpeakerLayout::octal());
    let channels = layout.num_output_channels();
    scene.create_listener(Vbap::new(layout, Dimensions::Two)?)?;

    let id = scene.create_source(
        SoundSource::builder()
            .position(RADIUS, 0.0, 0.0)
            .near_clip(1.0)
            .far_clip(20.0)
            .processing_mode(ProcessingMode::PerSample),
    )?;
    let handle = scene.source(id).map(|s| s.handle()).ok_or("source vanished")?;

    let path = std::env::temp_dir().join("spatia_orbit.wav");
    let spec = WavSpec {
        channels: channels as u16,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;

    let blocks = (SECONDS * SAMPLE_RATE) as usize / FRAMES;
    let mut tone = vec![0.0f32; FRAMES];
    let mut data = vec![0.0f32; channels * FRAMES];
    let mut energy = vec![0.0f64; channels];
    let mut phase = 0.0f64;

    for block in 0..blocks {
        // one revolution every three seconds
        let t = (block * FRAMES) as f64 / SAMPLE_RATE;
        let angle = t * std::f64::consts::TAU / 3.0;
        handle.set_position(RADIUS * angle.cos(), RADIUS * angle.sin(), 0.0);

        for s in tone.iter_mut() {
            *s = (phase.sin() * 0.5) as f32;
            phase += std::f64::consts::TAU * 440.0 / SAMPLE_RATE;
        }
        scene.write_source(id, &tone)?;

        let mut out = OutputBlock::new(&mut data, FRAMES);
        out.clear();
        scene.render(&mut out);

        for frame in 0..FRAMES {
            for (ch, e) in energy.iter_mut().enumerate() {
                let v = out.get(ch, frame);
                *e += (v * v) as f64;
                writer.write_sample(v)?;
            }
        }
    }
    writer.finalize()?;

    let total = (blocks * FRAMES) as f64;
    for (ch, e) in energy.iter().enumerate() {
        println!("channel {ch}: rms {:.4}", (e / total).sqrt());
    }
    println!("Wrote {}", path.display());
    Ok(())
}
