use ndarray::{s, Array2, ArrayD, Ix2};

use super::error::CompareError;

/// Relative tolerance used when checking an answer, as in `numpy.allclose`.
pub const DEFAULT_RTOL: f32 = 1e-5;
/// Absolute tolerance used when checking an answer, as in `numpy.allclose`.
pub const DEFAULT_ATOL: f32 = 1e-8;

/// Lifts an answer to a matrix: scalars become `1x1`, vectors a single row.
pub fn to_matrix(array: &ArrayD<f32>) -> Result<Array2<f32>, CompareError> {
    match array.ndim() {
        0 | 1 => {
            let flat: Vec<f32> = array.iter().copied().collect();
            let cols = flat.len();
            Array2::from_shape_vec((1, cols), flat)
                .map_err(|e| CompareError::ShapeMismatch(e.to_string()))
        }
        2 => array
            .view()
            .into_dimensionality::<Ix2>()
            .map(|view| view.to_owned())
            .map_err(|e| CompareError::ShapeMismatch(e.to_string())),
        rank => Err(CompareError::UnsupportedRank(rank)),
    }
}

/// Zero-pads both matrices at the bottom and right to their common bounding shape.
pub fn pad_to_common_shape(a: &Array2<f32>, b: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let rows = a.nrows().max(b.nrows());
    let cols = a.ncols().max(b.ncols());
    (pad(a, rows, cols), pad(b, rows, cols))
}

fn pad(matrix: &Array2<f32>, rows: usize, cols: usize) -> Array2<f32> {
    let mut padded = Array2::zeros((rows, cols));
    padded
        .slice_mut(s![..matrix.nrows(), ..matrix.ncols()])
        .assign(matrix);
    padded
}

/// `|actual - expected| <= atol + rtol * |expected|` for every element, shapes equal.
///
/// Unlike `numpy.allclose` there is no broadcasting: a `(3,)` answer never
/// matches a `(1, 3)` one.
pub fn allclose(actual: &ArrayD<f32>, expected: &ArrayD<f32>, rtol: f32, atol: f32) -> bool {
    actual.shape() == expected.shape()
        && actual
            .iter()
            .zip(expected.iter())
            .all(|(&a, &e)| (a - e).abs() <= atol + rtol * e.abs())
}

/// Checks a user's answer against the expected one.
///
/// With `shape_only` (the expected answer is random) only shapes are compared.
/// Scalars must match exactly; arrays are compared with [`allclose`].
pub fn outputs_match(user: &ArrayD<f32>, expected: &ArrayD<f32>, shape_only: bool) -> bool {
    if user.ndim() == 0 && expected.ndim() == 0 {
        return shape_only || user == expected;
    }
    if shape_only {
        return user.shape() == expected.shape();
    }
    allclose(user, expected, DEFAULT_RTOL, DEFAULT_ATOL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, array, Array3};

    #[test]
    fn test_to_matrix_scalar() {
        let m = to_matrix(&arr0(3.5f32).into_dyn()).unwrap();
        assert_eq!(m, array![[3.5f32]]);
    }

    #[test]
    fn test_to_matrix_vector_becomes_row() {
        let m = to_matrix(&array![1.0f32, 2.0, 3.0].into_dyn()).unwrap();
        assert_eq!(m.dim(), (1, 3));
    }

    #[test]
    fn test_to_matrix_matrix_unchanged() {
        let input = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let m = to_matrix(&input.clone().into_dyn()).unwrap();
        assert_eq!(m, input);
    }

    #[test]
    fn test_to_matrix_rejects_rank_three() {
        let cube = Array3::<f32>::zeros((2, 2, 2)).into_dyn();
        assert!(matches!(to_matrix(&cube), Err(CompareError::UnsupportedRank(3))));
    }

    #[test]
    fn test_pad_to_common_shape() {
        let a = array![[1.0f32, 2.0, 3.0]];
        let b = array![[4.0f32], [5.0]];
        let (pa, pb) = pad_to_common_shape(&a, &b);

        assert_eq!(pa, array![[1.0f32, 2.0, 3.0], [0.0, 0.0, 0.0]]);
        assert_eq!(pb, array![[4.0f32, 0.0, 0.0], [5.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_pad_same_shape_is_identity() {
        let a = array![[1.0f32, 2.0], [3.0, 4.0]];
        let (pa, pb) = pad_to_common_shape(&a, &a);
        assert_eq!(pa, a);
        assert_eq!(pb, a);
    }

    #[test]
    fn test_outputs_match_within_tolerance() {
        let expected = array![0.0f32, 1.0, 2.0].into_dyn();
        let user = array![0.0f32, 1.000001, 2.0].into_dyn();
        assert!(outputs_match(&user, &expected, false));

        let off = array![0.0f32, 1.1, 2.0].into_dyn();
        assert!(!outputs_match(&off, &expected, false));
    }

    #[test]
    fn test_outputs_match_shape_differs() {
        let expected = array![[1.0f32, 2.0]].into_dyn();
        let user = array![1.0f32, 2.0].into_dyn();
        assert!(!outputs_match(&user, &expected, false));
        assert!(!outputs_match(&user, &expected, true));
    }

    #[test]
    fn test_allclose_does_not_broadcast() {
        let row = array![[1.0f32, 2.0, 3.0]].into_dyn();
        let flat = array![1.0f32, 2.0, 3.0].into_dyn();
        assert!(allclose(&row, &row, DEFAULT_RTOL, DEFAULT_ATOL));
        assert!(!allclose(&flat, &row, DEFAULT_RTOL, DEFAULT_ATOL));
        assert!(!allclose(&arr0(1.0f32).into_dyn(), &flat, DEFAULT_RTOL, DEFAULT_ATOL));
    }

    #[test]
    fn test_outputs_match_shape_only() {
        let expected = array![[0.3f32, 0.9], [0.1, 0.5]].into_dyn();
        let user = array![[0.7f32, 0.2], [0.4, 0.8]].into_dyn();
        assert!(outputs_match(&user, &expected, true));
        assert!(!outputs_match(&user, &expected, false));
    }

    #[test]
    fn test_outputs_match_scalars_exact() {
        let expected = arr0(2.0f32).into_dyn();
        assert!(outputs_match(&arr0(2.0f32).into_dyn(), &expected, false));
        assert!(!outputs_match(&arr0(2.000001f32).into_dyn(), &expected, false));
    }
}
