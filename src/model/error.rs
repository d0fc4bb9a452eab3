use thiserror::Error;

use crate::utils::{IoError, MathError};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Config file error: {0}")]
    Io(#[from] IoError),
}

impl ModelError {
    pub fn dimension_mismatch(expected: usize, found: usize, what: &str) -> Self {
        ModelError::DimensionMismatch(format!(
            "{} must be {}, got {}",
            what, expected, found
        ))
    }
}
