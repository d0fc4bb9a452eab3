use std::fmt;

use ndarray::{s, Array4, ArrayView2};
use serde::Serialize;

use super::error::CompareError;
use crate::utils::mean_squared_error;

/// MSE below which two attention maps count as very close.
pub const VERY_CLOSE_MSE: f32 = 0.01;
/// MSE below which two attention maps count as somewhat similar.
pub const SOMEWHAT_SIMILAR_MSE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttentionStats {
    pub mean: f32,
    pub std: f32,
    pub max: f32,
}

impl AttentionStats {
    pub fn from_matrix(matrix: ArrayView2<f32>) -> Self {
        Self {
            mean: matrix.mean().unwrap_or(0.0),
            std: if matrix.is_empty() { 0.0 } else { matrix.std(0.0) },
            max: matrix.fold(f32::NEG_INFINITY, |a, &b| a.max(b)),
        }
    }
}

impl fmt::Display for AttentionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean {:.3}, std {:.3}, max {:.3}",
            self.mean, self.std, self.max
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Similarity {
    VeryClose,
    Somewhat,
    Differs,
}

impl Similarity {
    pub fn from_mse(mse: f32) -> Self {
        if mse < VERY_CLOSE_MSE {
            Similarity::VeryClose
        } else if mse < SOMEWHAT_SIMILAR_MSE {
            Similarity::Somewhat
        } else {
            Similarity::Differs
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Similarity::VeryClose => "attention pattern is very close",
            Similarity::Somewhat => "attention pattern is somewhat similar",
            Similarity::Differs => "attention pattern differs significantly",
        };
        f.write_str(text)
    }
}

/// Per-head comparison of two attention maps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadComparison {
    pub head: usize,
    pub mse: f32,
    pub similarity: Similarity,
    pub user: AttentionStats,
    pub expected: AttentionStats,
}

/// Compares the first batch entry of two `[batch, heads, seq, seq]` attention tensors head by head.
pub fn compare_attention(
    user: &Array4<f32>,
    expected: &Array4<f32>,
) -> Result<Vec<HeadComparison>, CompareError> {
    if user.shape() != expected.shape() {
        return Err(CompareError::ShapeMismatch(format!(
            "attention shapes differ: {:?} vs {:?}",
            user.shape(),
            expected.shape()
        )));
    }
    if user.dim().0 == 0 {
        return Ok(Vec::new());
    }

    let num_heads = user.dim().1;
    let mut heads = Vec::with_capacity(num_heads);
    for head in 0..num_heads {
        let u = user.slice(s![0, head, .., ..]);
        let e = expected.slice(s![0, head, .., ..]);
        let mse = mean_squared_error(&u, &e)?;

        heads.push(HeadComparison {
            head,
            mse,
            similarity: Similarity::from_mse(mse),
            user: AttentionStats::from_matrix(u),
            expected: AttentionStats::from_matrix(e),
        });
    }
    Ok(heads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_similarity_thresholds() {
        assert_eq!(Similarity::from_mse(0.0), Similarity::VeryClose);
        assert_eq!(Similarity::from_mse(0.009), Similarity::VeryClose);
        assert_eq!(Similarity::from_mse(0.01), Similarity::Somewhat);
        assert_eq!(Similarity::from_mse(0.099), Similarity::Somewhat);
        assert_eq!(Similarity::from_mse(0.1), Similarity::Differs);
    }

    #[test]
    fn test_stats() {
        let m = array![[0.5f32, 0.5], [1.0, 0.0]];
        let stats = AttentionStats::from_matrix(m.view());
        assert_abs_diff_eq!(stats.mean, 0.5);
        assert_abs_diff_eq!(stats.std, 0.125f32.sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(stats.max, 1.0);
    }

    #[test]
    fn test_compare_identical_maps() {
        let attn = Array4::from_shape_fn((1, 2, 3, 3), |(_, h, i, j)| {
            ((i + j + h) % 3 == 0) as u8 as f32
        });
        let heads = compare_attention(&attn, &attn).unwrap();
        assert_eq!(heads.len(), 2);
        for (h, cmp) in heads.iter().enumerate() {
            assert_eq!(cmp.head, h);
            assert_eq!(cmp.mse, 0.0);
            assert_eq!(cmp.similarity, Similarity::VeryClose);
            assert_eq!(cmp.user, cmp.expected);
        }
    }

    #[test]
    fn test_compare_opposite_maps() {
        let user = Array4::from_shape_fn((1, 1, 2, 2), |(_, _, i, j)| (i == j) as u8 as f32);
        let expected = Array4::from_shape_fn((1, 1, 2, 2), |(_, _, i, j)| (i != j) as u8 as f32);
        let heads = compare_attention(&user, &expected).unwrap();
        assert_abs_diff_eq!(heads[0].mse, 1.0);
        assert_eq!(heads[0].similarity, Similarity::Differs);
    }

    #[test]
    fn test_compare_shape_mismatch() {
        let a = Array4::<f32>::zeros((1, 2, 3, 3));
        let b = Array4::<f32>::zeros((1, 1, 3, 3));
        assert!(matches!(
            compare_attention(&a, &b),
            Err(CompareError::ShapeMismatch(_))
        ));
    }
}
