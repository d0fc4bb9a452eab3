//! Neural network layers

mod norm;

pub use norm::LayerNorm;
