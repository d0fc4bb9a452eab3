//! Self-attention encoder: attention, residual connection and layer normalization

use log::debug;
use ndarray::{Array3, Array4};
use rand::Rng;

use crate::model::{EncoderConfig, LayerNorm, ModelError, MultiHeadAttention};
use crate::utils::build_rng;

/// A single self-attention encoder layer with fixed random weights.
///
/// Every instance samples its own projections; nothing is shared between
/// instances and nothing is updated after construction.
#[derive(Debug, Clone)]
pub struct Encoder {
    attention: MultiHeadAttention,
    norm: LayerNorm,
}

impl Encoder {
    /// Creates an encoder with entropy-seeded weights.
    pub fn new(embed_dim: usize, num_heads: usize) -> Result<Self, ModelError> {
        Self::from_config(&EncoderConfig::new(embed_dim, num_heads))
    }

    /// Creates an encoder drawing its weights from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        embed_dim: usize,
        num_heads: usize,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        Self::with_config_and_rng(&EncoderConfig::new(embed_dim, num_heads), rng)
    }

    /// Creates an encoder from a config, seeded when `config.seed` is set.
    pub fn from_config(config: &EncoderConfig) -> Result<Self, ModelError> {
        let mut rng = build_rng(config.seed);
        debug!(
            "Building encoder from config (seeded: {})",
            config.seed.is_some()
        );
        Self::with_config_and_rng(config, &mut rng)
    }

    pub fn with_config_and_rng<R: Rng + ?Sized>(
        config: &EncoderConfig,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let attention = MultiHeadAttention::new(config, rng)?;
        Ok(Self {
            attention,
            norm: LayerNorm::new(config.layer_norm_eps),
        })
    }

    /// Wraps an existing attention layer, e.g. one with hand-picked weights.
    pub fn from_attention(attention: MultiHeadAttention, norm: LayerNorm) -> Self {
        Self { attention, norm }
    }

    pub fn embed_dim(&self) -> usize {
        self.attention.embed_dim()
    }

    pub fn num_heads(&self) -> usize {
        self.attention.num_heads()
    }

    pub fn head_dim(&self) -> usize {
        self.attention.head_dim()
    }

    pub fn attention(&self) -> &MultiHeadAttention {
        &self.attention
    }

    /// Runs `layer_norm(x + attention(x))` on `[batch, seq, embed_dim]` input.
    ///
    /// Returns the normalized output and the attention weights
    /// `[batch, num_heads, seq, seq]`. The input is not modified.
    pub fn forward(&self, x: &Array3<f32>) -> Result<(Array3<f32>, Array4<f32>), ModelError> {
        debug!("Encoder forward: input shape {:?}", x.shape());

        let (attn_out, attn_weights) = self.attention.forward(x)?;
        let residual = x + &attn_out;
        let output = self.norm.forward(&residual)?;

        Ok((output, attn_weights))
    }
}
