//! # Teselar
//!
//! Cache-blocked (tiled) matrix multiplication and multi-head attention
//! primitives in pure Rust.
//!
//! Teselar (Spanish: "to tessellate, to tile") decomposes the two matrix
//! products of scaled dot-product attention into fixed-size rectangular
//! tiles, accumulating partial products tile by tile instead of
//! materializing each score matrix in one contiguous dense call.
//!
//! ## Features
//!
//! - **Blocked matmul kernel**: batched rank-4 tiled multiply with explicit
//!   boundary clamping, plus a rayon-parallel variant
//! - **Attention orchestration**: head split, scaled `Q·Kᵗ`, softmax,
//!   `weights·V`, head merge, behind a strategy trait selected at
//!   construction time
//! - **Pure and stateless**: every call allocates fresh output and never
//!   mutates its inputs
//!
//! ## Example
//!
//! ```rust
//! use teselar::layers::{AttentionConfig, AttentionMechanism, TiledAttention};
//! use teselar::Tensor;
//!
//! let attention = TiledAttention::new(AttentionConfig {
//!     num_heads: 2,
//!     tile_size: 4,
//! }).unwrap();
//!
//! // Projected Q/K/V: [batch, seq_len, hidden_size]
//! let q = Tensor::from_vec(vec![1, 3, 4], vec![0.1; 12]).unwrap();
//! let context = attention.forward(&q, &q, &q).unwrap();
//! assert_eq!(context.shape(), &[1, 3, 4]);
//! ```
//!
//! ## Scope
//!
//! The crate begins after Q/K/V projection and ends before the output
//! projection; the surrounding transformer block owns both projections and
//! composes an [`layers::AttentionMechanism`] at construction time.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod layers;
pub mod matmul;
pub mod tensor;
pub mod testing;

// Re-exports for convenience
pub use error::{Result, TeselarError};
pub use tensor::Tensor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
