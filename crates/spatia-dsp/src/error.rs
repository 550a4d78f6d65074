//! Error types for spatia-dsp.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid delay capacity: {0} (need at least 4)")]
    InvalidCapacity(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = core::result::Result<T, Error>;
