use thiserror::Error;

use crate::model::ModelError;
use crate::utils::MathError;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Unsupported rank {0}: only scalars, vectors and matrices can be compared")]
    UnsupportedRank(usize),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
