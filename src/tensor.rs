//! Tensor implementation
//!
//! This module provides the core `Tensor` type, a dense N-dimensional array
//! with row-major layout. The blocked matmul kernel interprets rank-4
//! tensors as `(batch, head, row, col)`; that interpretation is validated at
//! operation entry rather than encoded in the type.

use std::fmt;

use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TeselarError};

/// Dense N-dimensional tensor with row-major layout
///
/// Element type is generic over numeric scalars; compute kernels operate on
/// `Tensor<f32>`, while `Tensor<f16>` (via the `half` crate) serves as a
/// 16-bit storage format converted at the boundary.
///
/// # Examples
///
/// ```
/// use teselar::Tensor;
///
/// // Create a 2×3 tensor
/// let t = Tensor::from_vec(vec![2, 3], vec![
///     1.0, 2.0, 3.0,
///     4.0, 5.0, 6.0,
/// ]).unwrap();
///
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.ndim(), 2);
/// assert_eq!(t.size(), 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor<T: Num> {
    /// Flattened data in row-major order
    data: Vec<T>,
    /// Shape of the tensor
    shape: Vec<usize>,
}

impl<T: Num + Clone> Tensor<T> {
    /// Create a new tensor from a vector and shape
    ///
    /// # Arguments
    ///
    /// * `shape` - Dimensions of the tensor
    /// * `data` - Flattened data in row-major order
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - Shape is empty
    /// - Shape contains zero
    /// - Data size doesn't match shape
    ///
    /// # Examples
    ///
    /// ```
    /// use teselar::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(t.shape(), &[2, 2]);
    /// ```
    pub fn from_vec(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(TeselarError::ShapeMismatch {
                reason: "Shape cannot be empty".to_string(),
            });
        }

        if shape.contains(&0) {
            return Err(TeselarError::ShapeMismatch {
                reason: "Shape dimensions cannot be zero".to_string(),
            });
        }

        let expected_size = shape.iter().product();

        if data.len() != expected_size {
            return Err(TeselarError::DataShapeMismatch {
                data_size: data.len(),
                shape: shape.clone(),
                expected: expected_size,
            });
        }

        Ok(Self { data, shape })
    }

    /// Create a zero-initialized tensor with the given shape
    ///
    /// # Errors
    ///
    /// Returns `Err` if the shape is empty or contains zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use teselar::Tensor;
    ///
    /// let t = Tensor::<f32>::zeros(vec![2, 3]).unwrap();
    /// assert!(t.data().iter().all(|x| *x == 0.0));
    /// ```
    pub fn zeros(shape: Vec<usize>) -> Result<Self> {
        let size = shape.iter().product();
        Self::from_vec(shape, vec![T::zero(); size])
    }

    /// Swap the last two axes, materializing the permuted row-major buffer
    ///
    /// For a rank-4 tensor `(batch, head, row, col)` this produces
    /// `(batch, head, col, row)`, the layout needed for the `Q·Kᵗ` score
    /// computation.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the tensor has fewer than 2 dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use teselar::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![2, 3], vec![
    ///     1.0, 2.0, 3.0,
    ///     4.0, 5.0, 6.0,
    /// ]).unwrap();
    /// let tt = t.transpose_last().unwrap();
    /// assert_eq!(tt.shape(), &[3, 2]);
    /// assert_eq!(tt.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    /// ```
    pub fn transpose_last(&self) -> Result<Self> {
        let ndim = self.shape.len();
        if ndim < 2 {
            return Err(TeselarError::ShapeMismatch {
                reason: format!(
                    "transpose_last requires at least 2 dimensions, got shape {:?}",
                    self.shape
                ),
            });
        }

        let rows = self.shape[ndim - 2];
        let cols = self.shape[ndim - 1];
        let outer: usize = self.shape[..ndim - 2].iter().product();

        let mut output = Vec::with_capacity(self.data.len());
        for block_idx in 0..outer {
            let base = block_idx * rows * cols;
            for col in 0..cols {
                for row in 0..rows {
                    output.push(self.data[base + row * cols + col].clone());
                }
            }
        }

        let mut shape = self.shape.clone();
        shape.swap(ndim - 2, ndim - 1);
        Self::from_vec(shape, output)
    }

    /// Get the shape of the tensor
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to the underlying data
    ///
    /// # Examples
    ///
    /// ```
    /// use teselar::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![2], vec![1.0, 2.0]).unwrap();
    /// assert_eq!(t.data(), &[1.0, 2.0]);
    /// ```
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Num + Clone + fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?}, data=[", self.shape)?;
        for (i, val) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{val}")?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tensor() {
        let t = Tensor::from_vec(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.size(), 6);
    }

    #[test]
    fn test_empty_shape_error() {
        let result = Tensor::from_vec(vec![], vec![1.0, 2.0]);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            TeselarError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_zero_dimension_error() {
        let result = Tensor::<f32>::from_vec(vec![2, 0], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_size_mismatch_error() {
        let result = Tensor::from_vec(vec![2, 3], vec![1.0, 2.0]);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            TeselarError::DataShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_zeros() {
        let t = Tensor::<f32>::zeros(vec![2, 4]).unwrap();
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.size(), 8);
        assert!(t.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zeros_invalid_shape() {
        let result = Tensor::<f32>::zeros(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_transpose_last_2d() {
        let t = Tensor::from_vec(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let tt = t.transpose_last().unwrap();
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_last_4d() {
        // Two (b, h) blocks, each 2x2; transposition acts per block
        let t = Tensor::from_vec(
            vec![2, 1, 2, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )
        .unwrap();
        let tt = t.transpose_last().unwrap();
        assert_eq!(tt.shape(), &[2, 1, 2, 2]);
        assert_eq!(tt.data(), &[1.0, 3.0, 2.0, 4.0, 5.0, 7.0, 6.0, 8.0]);
    }

    #[test]
    fn test_transpose_last_involution() {
        let t = Tensor::from_vec(vec![1, 2, 3, 4], (0..24).map(|i| i as f32).collect()).unwrap();
        let back = t.transpose_last().unwrap().transpose_last().unwrap();
        assert_eq!(back.shape(), t.shape());
        assert_eq!(back.data(), t.data());
    }

    #[test]
    fn test_transpose_last_rank1_error() {
        let t = Tensor::from_vec(vec![3], vec![1.0, 2.0, 3.0]).unwrap();
        let result = t.transpose_last();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            TeselarError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_display() {
        let t = Tensor::from_vec(vec![2], vec![1.0, 2.0]).unwrap();
        let display = format!("{t}");
        assert!(display.contains("shape=[2]"));
        assert!(display.contains('1'));
        assert!(display.contains('2'));
    }
}
