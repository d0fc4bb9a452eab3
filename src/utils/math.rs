use ndarray::{Array, Array4, ArrayBase, ArrayViewMut2, Axis, Data, Dimension, Zip};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MathError {
    #[error("Invalid axis: axis {axis} for array of rank {ndim}")]
    InvalidAxis { axis: usize, ndim: usize },
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Numerically stable softmax along `axis`.
///
/// Every lane along `axis` is shifted by its maximum before exponentiating, so the
/// largest entry maps to `exp(0) = 1` and the normalizer is never below one.
pub fn softmax<S, D>(x: &ArrayBase<S, D>, axis: Axis) -> Result<Array<f32, D>, MathError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    if axis.index() >= x.ndim() {
        return Err(MathError::InvalidAxis {
            axis: axis.index(),
            ndim: x.ndim(),
        });
    }

    let mut output = x.to_owned();
    for mut lane in output.lanes_mut(axis) {
        let max = lane.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        lane.mapv_inplace(|v| (v - max).exp());
        let sum = lane.sum();
        lane.mapv_inplace(|v| v / sum);
    }
    Ok(output)
}

/// Softmax over the last axis of a rank-2 view, in place.
pub fn softmax_2d(matrix: &mut ArrayViewMut2<f32>) {
    for mut row in matrix.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

/// Computes softmax along the last dimension of a 4D array
/// # Arguments
/// * `matrix` - Mutable reference to 4D array [batch_size, num_heads, seq_len, seq_len]
pub fn softmax_4d(matrix: &mut Array4<f32>) {
    for mut batch in matrix.outer_iter_mut() {
        for mut head in batch.outer_iter_mut() {
            softmax_2d(&mut head);
        }
    }
}

/// Normalizes every vector along the last axis to zero mean and unit deviation.
///
/// Uses the population standard deviation and adds `eps` to the deviation itself,
/// i.e. `(x - mean) / (std + eps)`, not `(x - mean) / sqrt(var + eps)`.
pub fn layer_norm<S, D>(x: &ArrayBase<S, D>, eps: f32) -> Result<Array<f32, D>, MathError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    if x.ndim() == 0 {
        return Err(MathError::InvalidAxis { axis: 0, ndim: 0 });
    }

    let last = Axis(x.ndim() - 1);
    let mut output = x.to_owned();
    for mut lane in output.lanes_mut(last) {
        let Some(mean) = lane.mean() else {
            continue;
        };
        let std = lane.std(0.0);
        lane.mapv_inplace(|v| (v - mean) / (std + eps));
    }
    Ok(output)
}

/// Mean of squared element-wise differences between two equally shaped arrays.
pub fn mean_squared_error<S1, S2, D>(
    a: &ArrayBase<S1, D>,
    b: &ArrayBase<S2, D>,
) -> Result<f32, MathError>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return Err(MathError::DimensionMismatch(format!(
            "Expected shape {:?}, got {:?}",
            a.shape(),
            b.shape()
        )));
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0f32;
    Zip::from(a).and(b).for_each(|&x, &y| {
        let d = x - y;
        total += d * d;
    });
    Ok(total / a.len() as f32)
}
