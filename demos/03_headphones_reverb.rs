//! # 03 - Headphones and Reverb
//!
//! A car drives past at 30 m/s with physical Doppler on a headphone layout.
//! The dry signal also feeds a plate reverb send that is mixed into the
//! stereo output. The result is written to a stereo WAV.
//!
//! **Concepts:** `StereoPanner`, `DopplerType::Physical`, `Reverb`, presence filter
//!
//! ```bash
//! cargo run --example 03_headphones_reverb
//! ```

use hound::{SampleFormat, WavSpec, WavWriter};
use spatia::prelude::*;
use spatia::{AttenuationLaw, Reverb};

const SAMPLE_RATE: f64 = 44100.0;
const FRAMES: usize = 128;
const SPEED: f64 = 30.0;
const SEND: f32 = 0.15;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut scene = AudioScene::builder()
        .sample_rate(SAMPLE_RATE)
        .num_frames(FRAMES)
        .build()?;
    scene.create_listener(StereoPanner::new(Arc::new(SpeakerLayout::headset()))?)?;

    let car = scene.create_source(
        SoundSource::builder()
            .position(-60.0, 5.0, 0.0)
            .near_clip(2.0)
            .far_clip(120.0)
            .attenuation_law(AttenuationLaw::InverseSquare)
            .doppler(DopplerType::Physical)
            .processing_mode(ProcessingMode::PerSample)
            .presence_filter(2, 2500.0, 1.5, 4.0),
    )?;
    let handle = scene.source(car).map(|s| s.handle()).ok_or("source vanished")?;

    let mut reverb = Reverb::new();
    reverb.set_decay(0.7).set_damping(0.5);

    let path = std::env::temp_dir().join("spatia_drive_by.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;

    let seconds = 120.0 / SPEED;
    let blocks = (seconds * SAMPLE_RATE) as usize / FRAMES;
    let mut engine = vec![0.0f32; FRAMES];
    let mut data = vec![0.0f32; 2 * FRAMES];
    let mut phase = 0.0f64;

    for block in 0..blocks {
        let t = (block * FRAMES) as f64 / SAMPLE_RATE;
        handle.set_position(-60.0 + SPEED * t, 5.0, 0.0);

        // sawtooth engine hum
        for s in engine.iter_mut() {
            *s = (phase * 2.0 - 1.0) as f32 * 0.3;
            phase = (phase + 110.0 / SAMPLE_RATE).fract();
        }
        scene.write_source(car, &engine)?;

        let mut out = OutputBlock::new(&mut data, FRAMES);
        out.clear();
        scene.render(&mut out);

        for (frame, &dry) in engine.iter().enumerate() {
            let (l, r) = reverb.process(dry * SEND);
            out.add(0, frame, l);
            out.add(1, frame, r);
        }
        for frame in 0..FRAMES {
            writer.write_sample(out.get(0, frame))?;
            writer.write_sample(out.get(1, frame))?;
        }
    }
    writer.finalize()?;

    println!("Wrote {} ({:.1} s)", path.display(), seconds);
    Ok(())
}
