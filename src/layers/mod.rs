//! Attention building blocks
//!
//! Implements the operations that sit between the two blocked matmul calls
//! of scaled dot-product attention:
//! - Row-wise softmax normalization
//! - Multi-head attention orchestration (tiled and dense strategies)
//!
//! ## Example
//!
//! ```rust,ignore
//! use teselar::layers::{softmax, AttentionConfig, AttentionMechanism, TiledAttention};
//!
//! let attention = TiledAttention::new(AttentionConfig { num_heads: 8, tile_size: 64 })?;
//! let context = attention.forward(&query, &key, &value)?;
//! ```

use crate::{
    error::{Result, TeselarError},
    tensor::Tensor,
};

mod attention;
pub use attention::{
    merge_heads, split_heads, AttentionConfig, AttentionMechanism, DenseAttention, TiledAttention,
};

/// Apply softmax activation function
///
/// Softmax: `y[i] = exp(x[i]) / sum(exp(x[j]))` for all j
///
/// Applies softmax normalization along the last dimension. Uses numerically
/// stable implementation with max subtraction to prevent overflow.
///
/// Every output row sums to 1 and contains no negative entries, which makes
/// the result usable as attention weights.
///
/// # Arguments
///
/// * `input` - Input tensor
///
/// # Returns
///
/// Tensor with softmax applied along last dimension (values sum to 1.0)
///
/// # Errors
///
/// Returns error if input is empty
///
/// # Examples
///
/// ```rust,ignore
/// let input = Tensor::from_vec(vec![3], vec![1.0, 2.0, 3.0])?;
/// let output = softmax(&input)?;
/// // output sums to 1.0
/// ```
pub fn softmax(input: &Tensor<f32>) -> Result<Tensor<f32>> {
    let data = input.data();
    let shape = input.shape();

    if data.is_empty() || shape.is_empty() {
        return Err(TeselarError::ShapeMismatch {
            reason: "Cannot apply softmax to empty tensor".to_string(),
        });
    }

    let last_dim = shape[shape.len() - 1];
    let num_rows = data.len() / last_dim;
    let mut output = Vec::with_capacity(data.len());

    // Apply softmax to each row independently
    for row_idx in 0..num_rows {
        let start = row_idx * last_dim;
        let end = start + last_dim;
        let row = &data[start..end];

        // Find max for numerical stability
        let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        // Compute exp(x - max) for each element
        let exp_vals: Vec<f32> = row.iter().map(|&x| (x - max_val).exp()).collect();

        // Sum of exponentials
        let sum_exp: f32 = exp_vals.iter().sum();

        // Normalize to get probabilities
        for &exp_val in &exp_vals {
            output.push(exp_val / sum_exp);
        }
    }

    Tensor::from_vec(shape.to_vec(), output)
}
