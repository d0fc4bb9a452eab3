use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::model::config::default_layer_norm_eps;
use crate::utils::{layer_norm, MathError};

/// Parameter-free layer normalization over the last axis
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LayerNorm {
    eps: f32,
}

impl Default for LayerNorm {
    fn default() -> Self {
        Self::new(default_layer_norm_eps())
    }
}

impl LayerNorm {
    pub fn new(eps: f32) -> Self {
        Self { eps }
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Forward pass over any rank; shape is preserved
    pub fn forward<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f32, D>, MathError>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        layer_norm(x, self.eps)
    }
}
