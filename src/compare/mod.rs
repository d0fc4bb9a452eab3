//! Answer checking and attention-map comparison between two answers
mod error;
mod matrix;
mod pipeline;
mod report;

pub use error::CompareError;
pub use matrix::{
    allclose, outputs_match, pad_to_common_shape, to_matrix, DEFAULT_ATOL, DEFAULT_RTOL,
};
pub use pipeline::{
    compare_outputs, comparison_heads, encode_matrix, random_attention, ComparisonReport,
};
pub use report::{
    compare_attention, AttentionStats, HeadComparison, Similarity, SOMEWHAT_SIMILAR_MSE,
    VERY_CLOSE_MSE,
};
