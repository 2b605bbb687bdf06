//! Property-based tests using proptest
//!
//! Tests mathematical invariants of the blocked matmul kernel and the
//! attention orchestrator:
//! - Equivalence to the dense product for arbitrary tile sizes
//! - Tile-size invariance
//! - Parallel/sequential kernel parity
//! - Softmax row-stochasticity
//! - Orchestrator shape preservation

use proptest::prelude::*;
use teselar::layers::{softmax, AttentionConfig, AttentionMechanism, DenseAttention, TiledAttention};
use teselar::matmul::{blocked_matmul, blocked_matmul_parallel};
use teselar::tensor::Tensor;
use teselar::testing::SyntheticTensorGenerator;

/// Naive dense reference: `C[b, h] = A[b, h] @ B[b, h]`
fn dense_reference(a: &Tensor<f32>, b: &Tensor<f32>) -> Vec<f32> {
    let (batch, heads, n, m) = (a.shape()[0], a.shape()[1], a.shape()[2], a.shape()[3]);
    let p = b.shape()[3];
    let a_data = a.data();
    let b_data = b.data();

    let mut c = vec![0.0f32; batch * heads * n * p];
    for pair_idx in 0..batch * heads {
        for i in 0..n {
            for j in 0..p {
                let mut acc = 0.0;
                for k in 0..m {
                    acc += a_data[pair_idx * n * m + i * m + k]
                        * b_data[pair_idx * m * p + k * p + j];
                }
                c[pair_idx * n * p + i * p + j] = acc;
            }
        }
    }
    c
}

// ============================================================================
// BLOCKED MATMUL PROPERTY TESTS
// ============================================================================

proptest! {
    /// Blocked result equals the dense product for any valid tile size,
    /// including sizes that do not divide any axis and sizes larger than
    /// every axis
    #[test]
    fn prop_blocked_matmul_matches_dense(
        batch in 1usize..3,
        heads in 1usize..3,
        n in 1usize..7,
        m in 1usize..7,
        p in 1usize..7,
        tile_size in 1usize..12,
        seed in 0u64..1000,
    ) {
        let a = SyntheticTensorGenerator::new(seed)
            .tensor_f32(&[batch, heads, n, m]).expect("valid shape");
        let b = SyntheticTensorGenerator::new(seed + 1)
            .tensor_f32(&[batch, heads, m, p]).expect("valid shape");

        let c = blocked_matmul(&a, &b, tile_size).expect("valid multiply");
        prop_assert_eq!(c.shape(), &[batch, heads, n, p]);

        let expected = dense_reference(&a, &b);
        for (got, want) in c.data().iter().zip(expected.iter()) {
            prop_assert!((got - want).abs() < 1e-4, "got {}, want {}", got, want);
        }
    }

    /// For fixed operands the result does not depend on the tile size
    #[test]
    fn prop_tile_size_invariance(
        n in 1usize..7,
        m in 1usize..7,
        p in 1usize..7,
        tile_a in 1usize..12,
        tile_b in 1usize..12,
        seed in 0u64..1000,
    ) {
        let a = SyntheticTensorGenerator::new(seed)
            .tensor_f32(&[2, 2, n, m]).expect("valid shape");
        let b = SyntheticTensorGenerator::new(seed + 1)
            .tensor_f32(&[2, 2, m, p]).expect("valid shape");

        let c_a = blocked_matmul(&a, &b, tile_a).expect("valid multiply");
        let c_b = blocked_matmul(&a, &b, tile_b).expect("valid multiply");

        for (x, y) in c_a.data().iter().zip(c_b.data().iter()) {
            prop_assert!((x - y).abs() < 1e-4, "{} != {}", x, y);
        }
    }

    /// The parallel kernel distributes whole (batch, head) blocks, so it
    /// reproduces the sequential result exactly
    #[test]
    fn prop_parallel_matches_sequential(
        batch in 1usize..4,
        heads in 1usize..4,
        n in 1usize..6,
        m in 1usize..6,
        p in 1usize..6,
        tile_size in 1usize..8,
        seed in 0u64..1000,
    ) {
        let a = SyntheticTensorGenerator::new(seed)
            .tensor_f32(&[batch, heads, n, m]).expect("valid shape");
        let b = SyntheticTensorGenerator::new(seed + 1)
            .tensor_f32(&[batch, heads, m, p]).expect("valid shape");

        let sequential = blocked_matmul(&a, &b, tile_size).expect("valid multiply");
        let parallel = blocked_matmul_parallel(&a, &b, tile_size).expect("valid multiply");

        prop_assert_eq!(sequential.data(), parallel.data());
    }
}

// ============================================================================
// SOFTMAX PROPERTY TESTS
// ============================================================================

proptest! {
    /// Softmax rows sum to 1
    #[test]
    fn prop_softmax_rows_sum_to_one(
        values in prop::collection::vec(
            prop::num::f32::NORMAL.prop_filter("bounded", |x| x.is_finite() && x.abs() < 100.0),
            1..=64
        )
    ) {
        let len = values.len();
        let input = Tensor::from_vec(vec![len], values).expect("valid shape");
        let output = softmax(&input).expect("valid input");

        let sum: f32 = output.data().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-5, "row sums to {}", sum);
    }

    /// Softmax never produces negative entries
    #[test]
    fn prop_softmax_non_negative(
        values in prop::collection::vec(
            prop::num::f32::NORMAL.prop_filter("bounded", |x| x.is_finite() && x.abs() < 100.0),
            2..=32
        )
    ) {
        let len = values.len();
        let input = Tensor::from_vec(vec![len], values).expect("valid shape");
        let output = softmax(&input).expect("valid input");

        prop_assert!(output.data().iter().all(|&x| x >= 0.0));
    }

    /// Row-stochasticity holds per row on multi-row inputs
    #[test]
    fn prop_softmax_multi_row_stochastic(
        rows in 1usize..6,
        cols in 1usize..12,
        seed in 0u64..1000,
    ) {
        let input = SyntheticTensorGenerator::new(seed)
            .tensor_f32(&[rows, cols]).expect("valid shape");
        let output = softmax(&input).expect("valid input");

        for row_idx in 0..rows {
            let row = &output.data()[row_idx * cols..(row_idx + 1) * cols];
            let sum: f32 = row.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-5, "row {} sums to {}", row_idx, sum);
            prop_assert!(row.iter().all(|&x| x >= 0.0));
        }
    }
}

// ============================================================================
// ATTENTION ORCHESTRATOR PROPERTY TESTS
// ============================================================================

proptest! {
    /// Output shape always equals the input (batch, seq_len, hidden_size)
    /// when num_heads divides hidden_size
    #[test]
    fn prop_attention_shape_preserved(
        batch in 1usize..3,
        seq_len in 1usize..6,
        num_heads in 1usize..4,
        head_dim in 1usize..4,
        tile_size in 1usize..10,
        seed in 0u64..1000,
    ) {
        let hidden_size = num_heads * head_dim;
        let shape = [batch, seq_len, hidden_size];
        let q = SyntheticTensorGenerator::new(seed).tensor_f32(&shape).expect("valid shape");
        let k = SyntheticTensorGenerator::new(seed + 1).tensor_f32(&shape).expect("valid shape");
        let v = SyntheticTensorGenerator::new(seed + 2).tensor_f32(&shape).expect("valid shape");

        let attention = TiledAttention::new(AttentionConfig { num_heads, tile_size })
            .expect("valid config");
        let output = attention.forward(&q, &k, &v).expect("valid forward");

        prop_assert_eq!(output.shape(), &shape);
    }

    /// Tiled and dense strategies agree within floating-point tolerance
    /// for any tile size
    #[test]
    fn prop_tiled_matches_dense_attention(
        batch in 1usize..3,
        seq_len in 1usize..6,
        num_heads in 1usize..4,
        head_dim in 1usize..4,
        tile_size in 1usize..10,
        seed in 0u64..1000,
    ) {
        let hidden_size = num_heads * head_dim;
        let shape = [batch, seq_len, hidden_size];
        let q = SyntheticTensorGenerator::new(seed).tensor_f32(&shape).expect("valid shape");
        let k = SyntheticTensorGenerator::new(seed + 1).tensor_f32(&shape).expect("valid shape");
        let v = SyntheticTensorGenerator::new(seed + 2).tensor_f32(&shape).expect("valid shape");

        let tiled = TiledAttention::new(AttentionConfig { num_heads, tile_size })
            .expect("valid config");
        let dense = DenseAttention::new(num_heads).expect("valid config");

        let tiled_out = tiled.forward(&q, &k, &v).expect("valid forward");
        let dense_out = dense.forward(&q, &k, &v).expect("valid forward");

        for (got, want) in tiled_out.data().iter().zip(dense_out.data().iter()) {
            prop_assert!((got - want).abs() < 1e-4, "got {}, want {}", got, want);
        }
    }
}
