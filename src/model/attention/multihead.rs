use log::{debug, trace};
use ndarray::{linalg::general_mat_mul, s, Array, Array2, Array3, Array4, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::{
    model::{EncoderConfig, ModelError},
    utils::softmax_4d,
};

/// Multi-head self-attention with fixed random projections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHeadAttention {
    num_heads: usize,
    embed_dim: usize,
    head_dim: usize,
    w_q: Array2<f32>, // [embed_dim, embed_dim]
    w_k: Array2<f32>,
    w_v: Array2<f32>,
    w_o: Array2<f32>, // output projection
}

impl MultiHeadAttention {
    /// Samples all four projections from `N(0, 1) / sqrt(embed_dim)`.
    pub fn new<R: Rng + ?Sized>(config: &EncoderConfig, rng: &mut R) -> Result<Self, ModelError> {
        config.validate()?;

        let embed_dim = config.embed_dim;
        let normal = Normal::new(0.0f32, 1.0)
            .map_err(|e| ModelError::InitializationError(e.to_string()))?;
        let scale = (embed_dim as f32).sqrt();
        let shape = (embed_dim, embed_dim);

        let w_q = Array::random_using(shape, normal, rng) / scale;
        let w_k = Array::random_using(shape, normal, rng) / scale;
        let w_v = Array::random_using(shape, normal, rng) / scale;
        let w_o = Array::random_using(shape, normal, rng) / scale;

        debug!(
            "Initialized attention: embed_dim={}, num_heads={}, head_dim={}",
            embed_dim,
            config.num_heads,
            config.head_dim()
        );

        Ok(Self {
            num_heads: config.num_heads,
            embed_dim,
            head_dim: config.head_dim(),
            w_q,
            w_k,
            w_v,
            w_o,
        })
    }

    /// Builds the layer from explicit projection matrices.
    pub fn from_weights(
        num_heads: usize,
        w_q: Array2<f32>,
        w_k: Array2<f32>,
        w_v: Array2<f32>,
        w_o: Array2<f32>,
    ) -> Result<Self, ModelError> {
        let embed_dim = w_q.nrows();
        EncoderConfig::new(embed_dim, num_heads).validate()?;
        for (name, w) in [("w_q", &w_q), ("w_k", &w_k), ("w_v", &w_v), ("w_o", &w_o)] {
            if w.dim() != (embed_dim, embed_dim) {
                return Err(ModelError::DimensionMismatch(format!(
                    "{} must be {}x{}, got {:?}",
                    name,
                    embed_dim,
                    embed_dim,
                    w.shape()
                )));
            }
        }

        Ok(Self {
            num_heads,
            embed_dim,
            head_dim: embed_dim / num_heads,
            w_q,
            w_k,
            w_v,
            w_o,
        })
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Query, key, value and output projections, in that order.
    pub fn weights(&self) -> [&Array2<f32>; 4] {
        [&self.w_q, &self.w_k, &self.w_v, &self.w_o]
    }

    /// `x @ weights` applied to every (batch, position) row.
    pub fn project_input(
        &self,
        x: &Array3<f32>,
        weights: &Array2<f32>,
    ) -> Result<Array3<f32>, ModelError> {
        let (batch_size, seq_len, in_dim) = x.dim();
        if weights.nrows() != in_dim {
            return Err(ModelError::dimension_mismatch(
                in_dim,
                weights.nrows(),
                "projection input rows",
            ));
        }
        let proj_dim = weights.ncols();

        let mut result = Array3::zeros((batch_size, seq_len, proj_dim));
        for (x_batch, mut out_batch) in x.outer_iter().zip(result.outer_iter_mut()) {
            general_mat_mul(1.0, &x_batch, weights, 0.0, &mut out_batch);
        }
        Ok(result)
    }

    /// `[batch, seq, embed_dim]` -> `[batch, heads, seq, head_dim]`.
    ///
    /// Head `h` owns the contiguous columns `h * head_dim .. (h + 1) * head_dim`.
    pub fn split_heads(&self, x: &Array3<f32>) -> Result<Array4<f32>, ModelError> {
        let (b, s, embed_dim) = x.dim();
        if embed_dim != self.embed_dim {
            return Err(ModelError::dimension_mismatch(
                self.embed_dim,
                embed_dim,
                "split input last dimension",
            ));
        }
        Ok(Array4::from_shape_fn(
            (b, self.num_heads, s, self.head_dim),
            |(bi, h, t, d)| x[[bi, t, h * self.head_dim + d]],
        ))
    }

    /// Exact inverse of [`split_heads`](Self::split_heads).
    pub fn merge_heads(&self, x: &Array4<f32>) -> Array3<f32> {
        let (b, h, s, d) = x.dim();
        let mut merged = Array3::zeros((b, s, h * d));
        for head in 0..h {
            merged
                .slice_mut(s![.., .., head * d..(head + 1) * d])
                .assign(&x.index_axis(Axis(1), head));
        }
        merged
    }

    /// Returns `(attention_weights, output)` for head-split `q`, `k`, `v`.
    ///
    /// Keys and values may be longer or shorter than the queries; the weights
    /// are `[batch, heads, q_len, k_len]`.
    pub fn scaled_dot_product_attention(
        &self,
        q: &Array4<f32>, // [batch_size, num_heads, seq_len, head_dim]
        k: &Array4<f32>,
        v: &Array4<f32>,
    ) -> Result<(Array4<f32>, Array4<f32>), ModelError> {
        let (batch_size, num_heads, seq_len, head_dim) = q.dim();
        let (k_batch, k_heads, k_len, k_dim) = k.dim();
        let (v_batch, v_heads, v_len, v_dim) = v.dim();
        if (k_batch, k_heads, k_dim) != (batch_size, num_heads, head_dim) {
            return Err(ModelError::DimensionMismatch(format!(
                "keys {:?} do not match queries {:?}",
                k.shape(),
                q.shape()
            )));
        }
        if (v_batch, v_heads, v_len) != (batch_size, num_heads, k_len) {
            return Err(ModelError::DimensionMismatch(format!(
                "values {:?} do not match keys {:?}",
                v.shape(),
                k.shape()
            )));
        }
        let scale = (head_dim as f32).sqrt();

        // 1. Compute attention scores (QK^T / sqrt(d_k))
        let mut scores = Array4::<f32>::zeros((batch_size, num_heads, seq_len, k_len));
        for b in 0..batch_size {
            for h in 0..num_heads {
                let q_head = q.slice(s![b, h, .., ..]);
                let k_head = k.slice(s![b, h, .., ..]);
                let dot = q_head.dot(&k_head.t()) / scale;

                trace!(
                    "Scores batch={} head={}: min={:.4}, max={:.4}",
                    b,
                    h,
                    dot.fold(f32::INFINITY, |a, &x| a.min(x)),
                    dot.fold(f32::NEG_INFINITY, |a, &x| a.max(x))
                );

                scores.slice_mut(s![b, h, .., ..]).assign(&dot);
            }
        }

        // 2. Normalize each query row
        let mut attn_weights = scores;
        softmax_4d(&mut attn_weights);

        // 3. Weighted sum of values
        let mut output = Array4::<f32>::zeros((batch_size, num_heads, seq_len, v_dim));
        for b in 0..batch_size {
            for h in 0..num_heads {
                let weights = attn_weights.slice(s![b, h, .., ..]);
                let values = v.slice(s![b, h, .., ..]);
                output
                    .slice_mut(s![b, h, .., ..])
                    .assign(&weights.dot(&values));
            }
        }

        Ok((attn_weights, output))
    }

    /// Attention sublayer without residual or normalization.
    ///
    /// Returns the output-projected attention `[batch, seq, embed_dim]` and the
    /// weights `[batch, heads, seq, seq]`.
    pub fn forward(&self, x: &Array3<f32>) -> Result<(Array3<f32>, Array4<f32>), ModelError> {
        let (_, _, embed_dim) = x.dim();
        if embed_dim != self.embed_dim {
            return Err(ModelError::dimension_mismatch(
                self.embed_dim,
                embed_dim,
                "input last dimension",
            ));
        }

        let q_heads = self.split_heads(&self.project_input(x, &self.w_q)?)?;
        let k_heads = self.split_heads(&self.project_input(x, &self.w_k)?)?;
        let v_heads = self.split_heads(&self.project_input(x, &self.w_v)?)?;

        let (attn_weights, heads_out) =
            self.scaled_dot_product_attention(&q_heads, &k_heads, &v_heads)?;

        let merged = self.merge_heads(&heads_out);
        let output = self.project_input(&merged, &self.w_o)?;

        Ok((output, attn_weights))
    }
}
