use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::model::{positional::PositionalEncoding, ModelError};

/// Fixed sinusoidal position table of shape `(seq_len, model_dim)`.
///
/// Column `j` belongs to frequency pair `i = j / 2`: even columns hold
/// `sin(pos / 10000^(2i / model_dim))`, odd columns the matching cosine.
pub fn positional_encoding(seq_len: usize, model_dim: usize) -> Array2<f32> {
    Array2::from_shape_fn((seq_len, model_dim), |(pos, j)| {
        let pair = (2 * (j / 2)) as f64;
        let angle = pos as f64 / 10000f64.powf(pair / model_dim as f64);
        let value = if j % 2 == 0 { angle.sin() } else { angle.cos() };
        value as f32
    })
}

/// Sinusoidal positional encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinusoidalPositionalEncoding {
    pub encoding: Array2<f32>,
}

impl SinusoidalPositionalEncoding {
    pub fn new(max_len: usize, model_dim: usize) -> Self {
        Self {
            encoding: positional_encoding(max_len, model_dim),
        }
    }

    pub fn max_len(&self) -> usize {
        self.encoding.nrows()
    }

    pub fn model_dim(&self) -> usize {
        self.encoding.ncols()
    }
}

impl PositionalEncoding for SinusoidalPositionalEncoding {
    fn forward(&self, input: &Array3<f32>) -> Result<Array3<f32>, ModelError> {
        let (_, seq_len, model_dim) = input.dim();
        if model_dim != self.model_dim() {
            return Err(ModelError::dimension_mismatch(
                self.model_dim(),
                model_dim,
                "input model dimension",
            ));
        }
        if seq_len > self.max_len() {
            return Err(ModelError::DimensionMismatch(format!(
                "sequence length {} exceeds maximum length {}",
                seq_len,
                self.max_len()
            )));
        }

        let encoding = self.encoding.slice(s![..seq_len, ..]);
        let mut output = input.to_owned();
        for mut batch in output.outer_iter_mut() {
            batch += &encoding;
        }

        Ok(output)
    }
}
