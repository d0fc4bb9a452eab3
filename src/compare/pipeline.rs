use log::{debug, info, warn};
use ndarray::{Array2, Array3, Array4, ArrayD};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use super::error::CompareError;
use super::matrix::{outputs_match, pad_to_common_shape, to_matrix};
use super::report::{compare_attention, HeadComparison};
use crate::model::{Encoder, ModelError, PositionalEncoding, SinusoidalPositionalEncoding};

/// Head count used when encoding compared answers: 2 for even widths, else 1.
pub fn comparison_heads(model_dim: usize) -> usize {
    if model_dim >= 2 && model_dim % 2 == 0 {
        2
    } else {
        1
    }
}

fn add_positional_encoding(x: &Array3<f32>) -> Result<Array3<f32>, ModelError> {
    let (_, seq_len, model_dim) = x.dim();
    SinusoidalPositionalEncoding::new(seq_len, model_dim).forward(x)
}

/// Treats a `(seq_len, model_dim)` matrix as one sequence, adds positional
/// encoding and runs it through a freshly sampled encoder.
pub fn encode_matrix<R: Rng + ?Sized>(
    matrix: &Array2<f32>,
    num_heads: usize,
    rng: &mut R,
) -> Result<(Array3<f32>, Array4<f32>), ModelError> {
    let (seq_len, model_dim) = matrix.dim();
    let encoder = Encoder::with_rng(model_dim, num_heads, rng)?;

    let x = matrix
        .to_owned()
        .into_shape((1, seq_len, model_dim))
        .map_err(|e| ModelError::DimensionMismatch(e.to_string()))?;
    let x = add_positional_encoding(&x)?;
    encoder.forward(&x)
}

/// Attention maps of a fresh encoder over standard-normal input plus positional encoding.
pub fn random_attention<R: Rng + ?Sized>(
    seq_len: usize,
    model_dim: usize,
    num_heads: usize,
    rng: &mut R,
) -> Result<Array4<f32>, ModelError> {
    let encoder = Encoder::with_rng(model_dim, num_heads, rng)?;

    let x: Array3<f32> = Array3::random_using((1, seq_len, model_dim), StandardNormal, rng);
    let x = add_positional_encoding(&x)?;
    let (_, attention) = encoder.forward(&x)?;
    Ok(attention)
}

/// Outcome of checking an answer and comparing the attention it induces
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub correct: bool,
    pub shape: (usize, usize),
    pub num_heads: usize,
    pub heads: Vec<HeadComparison>,
    #[serde(skip)]
    pub user_attention: Array4<f32>,
    #[serde(skip)]
    pub expected_attention: Array4<f32>,
}

/// Checks `user` against `expected`, then encodes both answers with independent
/// encoders and compares their attention maps head by head.
pub fn compare_outputs<R: Rng + ?Sized>(
    user: &ArrayD<f32>,
    expected: &ArrayD<f32>,
    shape_only: bool,
    rng: &mut R,
) -> Result<ComparisonReport, CompareError> {
    let correct = outputs_match(user, expected, shape_only);
    info!("Answer {}", if correct { "matches" } else { "does not match" });

    let user_matrix = to_matrix(user)?;
    let expected_matrix = to_matrix(expected)?;
    if user_matrix.dim() != expected_matrix.dim() {
        warn!(
            "Padding answers to a common shape: {:?} vs {:?}",
            user_matrix.dim(),
            expected_matrix.dim()
        );
    }
    let (user_matrix, expected_matrix) = pad_to_common_shape(&user_matrix, &expected_matrix);

    let shape = user_matrix.dim();
    let num_heads = comparison_heads(shape.1);
    debug!("Encoding {:?} answers with {} heads", shape, num_heads);

    let (_, user_attention) = encode_matrix(&user_matrix, num_heads, rng)?;
    let (_, expected_attention) = encode_matrix(&expected_matrix, num_heads, rng)?;
    let heads = compare_attention(&user_attention, &expected_attention)?;

    Ok(ComparisonReport {
        correct,
        shape,
        num_heads,
        heads,
        user_attention,
        expected_attention,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_comparison_heads_divides() {
        for dim in 1..=16 {
            let heads = comparison_heads(dim);
            assert_eq!(dim % heads, 0, "dim {} heads {}", dim, heads);
        }
        assert_eq!(comparison_heads(8), 2);
        assert_eq!(comparison_heads(3), 1);
        assert_eq!(comparison_heads(1), 1);
    }

    #[test]
    fn test_encode_matrix_shapes() {
        let mut rng = SmallRng::seed_from_u64(3);
        let matrix = Array2::from_shape_fn((4, 6), |(i, j)| (i * 6 + j) as f32);
        let (output, attention) = encode_matrix(&matrix, 2, &mut rng).unwrap();
        assert_eq!(output.dim(), (1, 4, 6));
        assert_eq!(attention.dim(), (1, 2, 4, 4));
    }

    #[test]
    fn test_random_attention_rows_stochastic() {
        let mut rng = SmallRng::seed_from_u64(11);
        let attention = random_attention(5, 8, 2, &mut rng).unwrap();
        assert_eq!(attention.dim(), (1, 2, 5, 5));
        for row in attention.lanes(Axis(3)) {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_random_attention_rejects_indivisible() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            random_attention(5, 6, 4, &mut rng),
            Err(ModelError::ConfigError(_))
        ));
    }

    #[test]
    fn test_compare_outputs_correct_answer() {
        let mut rng = SmallRng::seed_from_u64(21);
        let answer = array![[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]].into_dyn();
        let report = compare_outputs(&answer, &answer, false, &mut rng).unwrap();

        assert!(report.correct);
        assert_eq!(report.shape, (2, 4));
        assert_eq!(report.num_heads, 2);
        assert_eq!(report.heads.len(), 2);
        // Independent encoders: identical answers still produce different maps.
        assert_ne!(report.user_attention, report.expected_attention);
    }

    #[test]
    fn test_compare_outputs_pads_mismatched_shapes() {
        let mut rng = SmallRng::seed_from_u64(8);
        let user = array![1.0f32, 2.0, 3.0].into_dyn();
        let expected = array![[1.0f32, 2.0], [3.0, 4.0]].into_dyn();
        let report = compare_outputs(&user, &expected, false, &mut rng).unwrap();

        assert!(!report.correct);
        assert_eq!(report.shape, (2, 3));
        assert_eq!(report.num_heads, 1);
        assert_eq!(report.user_attention.dim(), (1, 1, 2, 2));
    }

    #[test]
    fn test_compare_outputs_scalar_answers() {
        let mut rng = SmallRng::seed_from_u64(4);
        let answer = ndarray::arr0(10.0f32).into_dyn();
        let report = compare_outputs(&answer, &answer, false, &mut rng).unwrap();
        assert!(report.correct);
        assert_eq!(report.shape, (1, 1));
        for head in &report.heads {
            // A single position attends only to itself.
            assert_eq!(head.mse, 0.0);
        }
    }

    #[test]
    fn test_compare_outputs_rejects_rank_three() {
        let mut rng = SmallRng::seed_from_u64(0);
        let cube = ndarray::Array3::<f32>::zeros((2, 2, 2)).into_dyn();
        assert!(matches!(
            compare_outputs(&cube, &cube, false, &mut rng),
            Err(CompareError::UnsupportedRank(3))
        ));
    }
}
