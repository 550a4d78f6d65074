//! Centralized error type for the spatia umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] spatia_core::Error),

    #[error("DSP: {0}")]
    Dsp(#[from] spatia_dsp::Error),

    #[error(transparent)]
    Scene(#[from] spatia_scene::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
