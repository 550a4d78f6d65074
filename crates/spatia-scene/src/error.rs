//! Error types for spatia-scene.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid speaker layout: {0}")]
    InvalidLayout(String),

    #[error("No valid speaker {kind} found among {speakers} speakers")]
    NoSpeakerSets { kind: &'static str, speakers: usize },

    #[error("Unsupported Ambisonic configuration: dimensions={dimensions}, order={order}")]
    UnsupportedAmbisonics { dimensions: u8, order: u8 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown listener: {0}")]
    UnknownListener(usize),

    #[error("Unknown source: {0}")]
    UnknownSource(u64),

    #[error(transparent)]
    Core(#[from] spatia_core::Error),

    #[error(transparent)]
    Dsp(#[from] spatia_dsp::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
