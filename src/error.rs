// error.rs
use thiserror::Error;

use crate::{
    compare::CompareError,
    model::ModelError,
    utils::{IoError, MathError},
};

#[derive(Error, Debug)]
pub enum TinyFormerError {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),
}
