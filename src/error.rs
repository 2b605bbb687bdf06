//! Error types for teselar operations
//!
//! Two failure classes cover the whole crate: incompatible tensor extents
//! and invalid construction-time configuration. Both are synchronous and
//! non-retryable, so every operation validates eagerly at entry and fails
//! fast with no partial output.

use thiserror::Error;

/// Error type for tensor and attention operations
#[derive(Debug, Error)]
pub enum TeselarError {
    /// Incompatible tensor extents passed to a kernel or orchestrator
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch {
        /// Description of the incompatible extents
        reason: String,
    },

    /// Flat data length does not match the product of the requested shape
    #[error("Data size {data_size} doesn't match shape {shape:?} (expected {expected})")]
    DataShapeMismatch {
        /// Number of elements provided
        data_size: usize,
        /// Requested shape
        shape: Vec<usize>,
        /// Number of elements the shape requires
        expected: usize,
    },

    /// Invalid configuration value (zero tile size, zero head count, or a
    /// head count that does not divide the hidden size)
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the invalid value
        reason: String,
    },
}

/// Result type alias for teselar operations
pub type Result<T> = std::result::Result<T, TeselarError>;
