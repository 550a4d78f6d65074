//! Spatial audio scene: moving sources rendered onto a loudspeaker (or
//! headphone) layout, block by block, with Doppler and distance attenuation.
//!
//! # Primary API
//!
//! - [`AudioScene`]: owns listeners and sources, drives the per-block render
//! - [`SoundSource`]: pose + delay line + attenuation/Doppler policy
//! - [`Listener`]: pose bound to one [`Spatializer`]
//! - [`SpeakerLayout`]: speaker directions, device channels and gains
//! - [`Vbap`], [`Dbap`], [`AmbisonicsSpatializer`], [`StereoPanner`]
//!
//! # Example
//!
//! ```no_run
//! use spatia_scene::{AudioScene, OutputBlock, SoundSource, SpeakerLayout, StereoPanner};
//! use std::sync::Arc;
//!
//! let mut scene = AudioScene::builder().num_frames(256).build()?;
//! scene.create_listener(StereoPanner::new(Arc::new(SpeakerLayout::stereo()))?)?;
//! let id = scene.create_source(SoundSource::builder().position(2.0, 1.0, 0.0))?;
//!
//! let mut data = vec![0.0f32; 2 * 256];
//! scene.write_source(id, &[0.0; 256])?;
//! scene.render(&mut OutputBlock::new(&mut data, 256));
//! # Ok::<(), spatia_scene::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod speaker;
pub use speaker::{Speaker, SpeakerLayout};

pub mod output;
pub use output::OutputBlock;

pub mod spatializer;
pub use spatializer::{
    AmbiDecoder, AmbiEncoder, AmbiFlavor, AmbisonicsSpatializer, Dbap, Dimensions, SpatialCache,
    Spatializer, SpeakerTriple, StereoPanner, Vbap,
};

mod source;
pub use source::{DopplerType, ProcessingMode, SoundSource, SoundSourceBuilder, SourceHandle};

mod listener;
pub use listener::Listener;

mod scene;
pub use scene::{AudioScene, AudioSceneBuilder, ListenerId, SourceId};

pub use spatia_core::{Pose, PoseHandle, Quat, SceneConfig, Vec3};
pub use spatia_dsp::{AttenuationLaw, DistanceAttenuation};
