//! Multi-head attention over the blocked matmul kernel
//!
//! Contains:
//! - `AttentionMechanism`: strategy capability, "given projected Q/K/V,
//!   return context"
//! - `TiledAttention`: cache-blocked scaled dot-product attention
//! - `DenseAttention`: same contract computed with whole-axis tiles
//! - `split_heads` / `merge_heads`: head-split layout conversions
//!
//! Linear projections that produce Q/K/V from raw hidden states, and the
//! output projection applied after head merging, belong to the surrounding
//! transformer block. The contract here begins after projection and ends
//! before the output projection.

use crate::{
    error::{Result, TeselarError},
    matmul::blocked_matmul,
    tensor::Tensor,
};

use super::softmax;

/// Immutable attention configuration, fixed at construction
///
/// Carries the two integers the orchestrator needs; nothing is read from
/// ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionConfig {
    /// Number of attention heads; must divide the hidden size of the
    /// tensors later passed to `forward`
    pub num_heads: usize,
    /// Edge length of the square tiles used by the blocked kernel
    pub tile_size: usize,
}

/// Attention strategy: compute context from projected Q/K/V
///
/// A transformer block holds one implementation, selected at construction
/// time. Inputs and output share the `(batch, seq_len, hidden_size)`
/// layout, so the block can merge the context into its own output
/// projection.
pub trait AttentionMechanism {
    /// Compute the attention context for projected query/key/value tensors
    ///
    /// # Errors
    ///
    /// Returns `TeselarError::ShapeMismatch` if the three tensors are not
    /// rank 3 with identical shapes, and `TeselarError::InvalidConfiguration`
    /// if the hidden size is not divisible by the configured head count.
    fn forward(
        &self,
        query: &Tensor<f32>,
        key: &Tensor<f32>,
        value: &Tensor<f32>,
    ) -> Result<Tensor<f32>>;
}

/// Validated extents of one attention call: `(batch, seq_len, hidden_size)`
fn validate_projected(
    query: &Tensor<f32>,
    key: &Tensor<f32>,
    value: &Tensor<f32>,
) -> Result<(usize, usize, usize)> {
    let q_shape = query.shape();
    let k_shape = key.shape();
    let v_shape = value.shape();

    if q_shape.len() != 3 {
        return Err(TeselarError::ShapeMismatch {
            reason: format!(
                "Expected rank-3 query [batch, seq_len, hidden_size], got {q_shape:?}"
            ),
        });
    }

    if k_shape != q_shape || v_shape != q_shape {
        return Err(TeselarError::ShapeMismatch {
            reason: format!(
                "Query/key/value shapes must match: Q={q_shape:?}, K={k_shape:?}, V={v_shape:?}"
            ),
        });
    }

    Ok((q_shape[0], q_shape[1], q_shape[2]))
}

/// Per-head dimension for a hidden size and head count
///
/// Violating divisibility is a configuration error, not a tensor error.
fn head_dim_for(hidden_size: usize, num_heads: usize) -> Result<usize> {
    if num_heads == 0 {
        return Err(TeselarError::InvalidConfiguration {
            reason: "num_heads must be > 0".to_string(),
        });
    }
    if !hidden_size.is_multiple_of(num_heads) {
        return Err(TeselarError::InvalidConfiguration {
            reason: format!(
                "hidden_size {hidden_size} must be divisible by num_heads {num_heads}"
            ),
        });
    }
    Ok(hidden_size / num_heads)
}

/// Reshape `(batch, seq_len, hidden_size)` into the head-split layout
/// `(batch, num_heads, seq_len, head_dim)` where
/// `head_dim = hidden_size / num_heads`
///
/// # Errors
///
/// Returns `TeselarError::ShapeMismatch` if the input is not rank 3, and
/// `TeselarError::InvalidConfiguration` if `hidden_size` is not divisible
/// by `num_heads`.
pub fn split_heads(input: &Tensor<f32>, num_heads: usize) -> Result<Tensor<f32>> {
    let shape = input.shape();
    if shape.len() != 3 {
        return Err(TeselarError::ShapeMismatch {
            reason: format!("Expected rank-3 tensor [batch, seq_len, hidden_size], got {shape:?}"),
        });
    }

    let (batch, seq_len, hidden_size) = (shape[0], shape[1], shape[2]);
    let head_dim = head_dim_for(hidden_size, num_heads)?;
    let data = input.data();

    let mut output = Vec::with_capacity(data.len());
    for batch_idx in 0..batch {
        for head_idx in 0..num_heads {
            for seq_idx in 0..seq_len {
                let row_start = (batch_idx * seq_len + seq_idx) * hidden_size;
                let head_start = row_start + head_idx * head_dim;
                for offset in 0..head_dim {
                    output.push(data[head_start + offset]);
                }
            }
        }
    }

    Tensor::from_vec(vec![batch, num_heads, seq_len, head_dim], output)
}

/// Reshape the head-split layout `(batch, num_heads, seq_len, head_dim)`
/// back into `(batch, seq_len, hidden_size)` by transposing the head and
/// sequence axes and flattening the last two axes
///
/// # Errors
///
/// Returns `TeselarError::ShapeMismatch` if the input is not rank 4.
pub fn merge_heads(input: &Tensor<f32>) -> Result<Tensor<f32>> {
    let shape = input.shape();
    if shape.len() != 4 {
        return Err(TeselarError::ShapeMismatch {
            reason: format!(
                "Expected rank-4 tensor [batch, num_heads, seq_len, head_dim], got {shape:?}"
            ),
        });
    }

    let (batch, num_heads, seq_len, head_dim) = (shape[0], shape[1], shape[2], shape[3]);
    let data = input.data();

    let mut output = Vec::with_capacity(data.len());
    for batch_idx in 0..batch {
        for seq_idx in 0..seq_len {
            for head_idx in 0..num_heads {
                let head_start =
                    ((batch_idx * num_heads + head_idx) * seq_len + seq_idx) * head_dim;
                for offset in 0..head_dim {
                    output.push(data[head_start + offset]);
                }
            }
        }
    }

    Tensor::from_vec(vec![batch, seq_len, num_heads * head_dim], output)
}

/// Scaled dot-product attention pipeline shared by both strategies
///
/// Split heads, compute `softmax(Q @ Kᵗ / sqrt(head_dim)) @ V` with the
/// blocked kernel, merge heads back.
fn scaled_dot_attention(
    query: &Tensor<f32>,
    key: &Tensor<f32>,
    value: &Tensor<f32>,
    num_heads: usize,
    tile_size: usize,
) -> Result<Tensor<f32>> {
    let (_, _, hidden_size) = validate_projected(query, key, value)?;
    let head_dim = head_dim_for(hidden_size, num_heads)?;

    let q = split_heads(query, num_heads)?;
    let k = split_heads(key, num_heads)?;
    let v = split_heads(value, num_heads)?;

    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / (head_dim as f32).sqrt();

    let scores = blocked_matmul(&q, &k.transpose_last()?, tile_size)?;
    let scaled: Vec<f32> = scores.data().iter().map(|&x| x * scale).collect();
    let scaled = Tensor::from_vec(scores.shape().to_vec(), scaled)?;

    let weights = softmax(&scaled)?;
    let context = blocked_matmul(&weights, &v, tile_size)?;

    // Debug assertion for numerical stability
    debug_assert!(
        context.data().iter().all(|&x| x.is_finite()),
        "Attention produced NaN or Inf values - check input scaling"
    );

    merge_heads(&context)
}

/// Cache-blocked scaled dot-product multi-head attention
///
/// Computes attention as:
/// ```text
/// Attention(Q, K, V) = softmax(Q @ K.T / sqrt(d_k)) @ V
/// ```
/// with both matrix products decomposed into `tile_size`-sided tiles, so no
/// score matrix is ever produced by one contiguous dense call.
///
/// Pure, stateless, synchronous: every `forward` call allocates fresh
/// output and never mutates its inputs.
///
/// # References
///
/// "Attention is All You Need" - Vaswani et al., 2017
#[derive(Debug, Clone)]
pub struct TiledAttention {
    /// Number of attention heads
    num_heads: usize,
    /// Tile edge length for both blocked multiplies
    tile_size: usize,
}

impl TiledAttention {
    /// Create a new tiled attention strategy
    ///
    /// # Arguments
    ///
    /// * `config` - Head count and tile size, fixed for the lifetime of the
    ///   strategy
    ///
    /// # Errors
    ///
    /// Returns `TeselarError::InvalidConfiguration` if `num_heads` or
    /// `tile_size` is zero.
    pub fn new(config: AttentionConfig) -> Result<Self> {
        if config.num_heads == 0 {
            return Err(TeselarError::InvalidConfiguration {
                reason: "num_heads must be > 0".to_string(),
            });
        }
        if config.tile_size == 0 {
            return Err(TeselarError::InvalidConfiguration {
                reason: "tile_size must be > 0".to_string(),
            });
        }

        Ok(Self {
            num_heads: config.num_heads,
            tile_size: config.tile_size,
        })
    }

    /// Get the number of attention heads
    #[must_use]
    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    /// Get the tile size
    #[must_use]
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }
}

impl AttentionMechanism for TiledAttention {
    fn forward(
        &self,
        query: &Tensor<f32>,
        key: &Tensor<f32>,
        value: &Tensor<f32>,
    ) -> Result<Tensor<f32>> {
        scaled_dot_attention(query, key, value, self.num_heads, self.tile_size)
    }
}

/// Dense scaled dot-product multi-head attention
///
/// Same contract as [`TiledAttention`], computed with a single whole-axis
/// tile per multiply. Selected by the caller at construction; the tiled
/// strategy never falls back to this one on its own.
#[derive(Debug, Clone)]
pub struct DenseAttention {
    /// Number of attention heads
    num_heads: usize,
}

impl DenseAttention {
    /// Create a new dense attention strategy
    ///
    /// # Errors
    ///
    /// Returns `TeselarError::InvalidConfiguration` if `num_heads` is zero.
    pub fn new(num_heads: usize) -> Result<Self> {
        if num_heads == 0 {
            return Err(TeselarError::InvalidConfiguration {
                reason: "num_heads must be > 0".to_string(),
            });
        }
        Ok(Self { num_heads })
    }

    /// Get the number of attention heads
    #[must_use]
    pub fn num_heads(&self) -> usize {
        self.num_heads
    }
}

impl AttentionMechanism for DenseAttention {
    fn forward(
        &self,
        query: &Tensor<f32>,
        key: &Tensor<f32>,
        value: &Tensor<f32>,
    ) -> Result<Tensor<f32>> {
        let (_, seq_len, hidden_size) = validate_projected(query, key, value)?;
        let head_dim = head_dim_for(hidden_size, self.num_heads)?;

        // One tile covering every axis degenerates each blocked multiply
        // into a single dense call
        let tile_size = seq_len.max(head_dim);
        scaled_dot_attention(query, key, value, self.num_heads, tile_size)
    }
}
