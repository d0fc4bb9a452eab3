//! Positional encoding implementations
mod positional;
pub use positional::PositionalEncoding;

mod sinusoidal;
pub use sinusoidal::{positional_encoding, SinusoidalPositionalEncoding};
