//! # Spatia - Real-time Spatial Audio Engine
//!
//! Renders moving sound sources onto any loudspeaker or headphone layout,
//! simulating propagation delay (Doppler) and distance attenuation.
//!
//! ## Architecture
//!
//! Spatia is an umbrella crate over:
//! - **spatia-core** - Poses, lock-free pose handoff, motion history, scene configuration
//! - **spatia-dsp** - Delay lines, biquads, crossover, plate reverb, attenuation laws
//! - **spatia-scene** - Speaker layouts, spatializers (VBAP, DBAP, Ambisonics, stereo),
//!   sources, listeners and the audio scene
//!
//! ## Quick Start
//!
//! ```no_run
//! use spatia::prelude::*;
//!
//! let mut scene = AudioScene::builder()
//!     .sample_rate(48000.0)
//!     .num_frames(256)
//!     .build()?;
//!
//! let layout = Arc::new(SpeakerLayout::octal());
//! scene.create_listener(Vbap::new(layout, Dimensions::Two)?)?;
//!
//! let bee = scene.create_source(SoundSource::builder().position(2.0, 1.0, 0.0))?;
//! let handle = scene.source(bee).map(|s| s.handle());
//!
//! // audio callback
//! let mut data = vec![0.0f32; 8 * 256];
//! scene.write_source(bee, &[0.0; 256])?;
//! scene.render(&mut OutputBlock::new(&mut data, 256));
//!
//! // control thread
//! if let Some(handle) = handle {
//!     handle.set_position(2.0, -1.0, 0.0);
//! }
//! # Ok::<(), spatia::Error>(())
//! ```

mod error;
pub use error::{Error, Result};

/// Re-export of spatia-core for direct access
pub use spatia_core as core;
/// Re-export of spatia-dsp for direct access
pub use spatia_dsp as dsp;
/// Re-export of spatia-scene for direct access
pub use spatia_scene as scene;

// Core types
pub use spatia_core::{
    direction_from_degrees, AtomicFlag, AtomicFloat, Pose, PoseHandle, Quat, SceneConfig, Vec3,
};

// DSP
pub use spatia_dsp::{
    AttenuationLaw, Biquad, BiquadCascade, BiquadKind, Crossover, DelayLine, DistanceAttenuation,
    Reverb,
};

// Scene
pub use spatia_scene::{
    AmbiDecoder, AmbiEncoder, AmbiFlavor, AmbisonicsSpatializer, AudioScene, AudioSceneBuilder,
    Dbap, Dimensions, DopplerType, Listener, ListenerId, OutputBlock, ProcessingMode,
    SoundSource, SoundSourceBuilder, SourceHandle, SourceId, SpatialCache, Spatializer, Speaker,
    SpeakerLayout, SpeakerTriple, StereoPanner, Vbap,
};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        AmbiFlavor, AmbisonicsSpatializer, AudioScene, Dbap, Dimensions, DopplerType,
        OutputBlock, ProcessingMode, SoundSource, Speaker, SpeakerLayout, StereoPanner, Vbap,
    };
    pub use crate::{Quat, Vec3};
    pub use std::sync::Arc;
}
