//! Property tests on randomly generated well-conditioned matrices.

use candle_core::{Device, Tensor};
use proptest::prelude::*;
use tensorfuzz_linalg::{cholesky, det, solve};

fn entry() -> impl Strategy<Value = f32> {
    -4.0f32..4.0
}

/// Random matrix made diagonally dominant, so pivots stay comfortably
/// away from zero.
fn dominant(n: usize, mut entries: Vec<f32>) -> Vec<f32> {
    for r in 0..n {
        let row_sum: f32 = (0..n).map(|c| entries[r * n + c].abs()).sum();
        entries[r * n + r] += row_sum + 1.0;
    }
    entries
}

proptest! {
    #[test]
    fn triangular_det_is_diagonal_product(
        n in 1usize..6,
        entries in proptest::collection::vec(entry(), 36),
    ) {
        let mut data = vec![0.0f32; n * n];
        for r in 0..n {
            for c in 0..=r {
                data[r * n + c] = entries[r * 6 + c];
            }
            // Keep the diagonal away from zero so the product is meaningful.
            if data[r * n + r].abs() < 0.5 {
                data[r * n + r] = 1.5;
            }
        }
        let expected: f32 = (0..n).map(|i| data[i * n + i]).product();
        let t = Tensor::from_vec(data, (n, n), &Device::Cpu).unwrap();
        let d = det(&t).unwrap();
        let tol = expected.abs().max(1.0) * 1e-4;
        prop_assert!((d - expected).abs() <= tol, "det {d} vs diagonal product {expected}");
    }

    #[test]
    fn solve_residual_is_small(
        n in 1usize..6,
        entries in proptest::collection::vec(entry(), 36),
        rhs in proptest::collection::vec(entry(), 6),
    ) {
        let data = dominant(n, entries[..n * n].to_vec());
        let a = Tensor::from_vec(data.clone(), (n, n), &Device::Cpu).unwrap();
        let b = Tensor::from_vec(rhs[..n].to_vec(), n, &Device::Cpu).unwrap();

        let x = solve(&a, &b).unwrap().to_vec1::<f32>().unwrap();
        for r in 0..n {
            let ax: f32 = (0..n).map(|c| data[r * n + c] * x[c]).sum();
            prop_assert!((ax - rhs[r]).abs() < 1e-2, "row {r}: {ax} vs {}", rhs[r]);
        }
    }

    #[test]
    fn cholesky_succeeds_on_gram_matrices(
        n in 1usize..5,
        entries in proptest::collection::vec(entry(), 25),
    ) {
        // A = B Bᵀ + I is symmetric positive definite by construction.
        let b = &entries[..n * n];
        let mut a = vec![0.0f32; n * n];
        for r in 0..n {
            for c in 0..n {
                let dot: f32 = (0..n).map(|k| b[r * n + k] * b[c * n + k]).sum();
                a[r * n + c] = dot + if r == c { 1.0 } else { 0.0 };
            }
        }
        let t = Tensor::from_vec(a.clone(), (n, n), &Device::Cpu).unwrap();
        let l = cholesky(&t).unwrap().to_vec2::<f32>().unwrap();

        // L is lower triangular with positive diagonal, and L Lᵀ = A.
        for r in 0..n {
            prop_assert!(l[r][r] > 0.0);
            for c in (r + 1)..n {
                prop_assert_eq!(l[r][c], 0.0);
            }
        }
        for r in 0..n {
            for c in 0..n {
                let back: f32 = (0..n).map(|k| l[r][k] * l[c][k]).sum();
                let tol = a[r * n + c].abs().max(1.0) * 1e-3;
                prop_assert!((back - a[r * n + c]).abs() <= tol);
            }
        }
    }
}
