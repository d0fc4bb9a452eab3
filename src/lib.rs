//! A minimal multi-head self-attention encoder for inspecting attention maps.
//!
//! The encoder samples fresh random projections on every construction and is never
//! trained; it exists to show the attention structure a random layer puts on an input.
//!
//! ```
//! use ndarray::Array3;
//! use tinyformer::{positional_encoding, Encoder};
//!
//! let encoder = Encoder::new(8, 2).unwrap();
//! let pe = positional_encoding(5, 8);
//! let mut x = Array3::<f32>::zeros((1, 5, 8));
//! for mut batch in x.outer_iter_mut() {
//!     batch += &pe;
//! }
//! let (output, attention) = encoder.forward(&x).unwrap();
//! assert_eq!(output.dim(), (1, 5, 8));
//! assert_eq!(attention.dim(), (1, 2, 5, 5));
//! ```

pub mod compare;
pub use compare::{compare_outputs, ComparisonReport, CompareError};

pub mod model;
pub use model::{
    positional_encoding, Encoder, EncoderConfig, ModelError, MultiHeadAttention,
    SinusoidalPositionalEncoding,
};

pub mod utils;
pub use utils::{build_rng, layer_norm, softmax, MathError};

pub mod error;
pub use error::TinyFormerError;
