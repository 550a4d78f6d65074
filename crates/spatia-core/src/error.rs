//! Error types for spatia-core.

use thiserror::Error;

/// Error type for spatia-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = core::result::Result<T, Error>;
