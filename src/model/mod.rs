//! Self-attention encoder and its building blocks

mod attention;
mod config;
mod encoder;
mod error;
mod layers;
mod positional;

pub use attention::MultiHeadAttention;
pub use config::EncoderConfig;
pub use encoder::Encoder;
pub use error::ModelError;
pub use layers::LayerNorm;
pub use positional::{positional_encoding, PositionalEncoding, SinusoidalPositionalEncoding};
