//! Synthetic tensor generators
//!
//! Deterministic tensor generation for reproducible test fixtures.
//! Based on PyTorch's `make_tensor` pattern.

use half::f16;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::tensor::Tensor;

/// Deterministic tensor generator for reproducible tests
///
/// # Example
///
/// ```rust
/// use teselar::testing::SyntheticTensorGenerator;
///
/// let gen = SyntheticTensorGenerator::new(42);
/// let q = gen.tensor_f32(&[1, 2, 8, 4]).unwrap();
/// assert_eq!(q.shape(), &[1, 2, 8, 4]);
/// ```
pub struct SyntheticTensorGenerator {
    seed: u64,
}

impl SyntheticTensorGenerator {
    /// Create generator with specific seed
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate F32 values with Xavier initialization scale
    ///
    /// Scale = 1 / sqrt(fan_in) where fan_in is the last dimension
    #[must_use]
    pub fn generate_f32(&self, shape: &[usize]) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n: usize = shape.iter().product();
        let fan_in = *shape.last().unwrap_or(&1);
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / (fan_in as f32).sqrt();

        (0..n).map(|_| rng.gen_range(-scale..scale)).collect()
    }

    /// Generate F16 values by converting the F32 stream
    #[must_use]
    pub fn generate_f16(&self, shape: &[usize]) -> Vec<f16> {
        self.generate_f32(shape)
            .into_iter()
            .map(f16::from_f32)
            .collect()
    }

    /// Generate a seeded F32 tensor
    ///
    /// # Errors
    ///
    /// Returns error if the shape is empty or contains zero.
    pub fn tensor_f32(&self, shape: &[usize]) -> Result<Tensor<f32>> {
        Tensor::from_vec(shape.to_vec(), self.generate_f32(shape))
    }

    /// Generate a seeded F16 storage tensor
    ///
    /// # Errors
    ///
    /// Returns error if the shape is empty or contains zero.
    pub fn tensor_f16(&self, shape: &[usize]) -> Result<Tensor<f16>> {
        Tensor::from_vec(shape.to_vec(), self.generate_f16(shape))
    }
}
