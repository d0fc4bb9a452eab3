//! Attention mechanisms
mod multihead;
pub use multihead::MultiHeadAttention;
