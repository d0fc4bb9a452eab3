use ndarray::Array3;

use crate::model::ModelError;

/// Trait for all positional encoding implementations
pub trait PositionalEncoding {
    /// Apply positional encoding to input embeddings
    /// Input shape: (batch_size, seq_len, embedding_dim)
    fn forward(&self, input: &Array3<f32>) -> Result<Array3<f32>, ModelError>;
}
