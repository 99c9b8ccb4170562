// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dense decompositions for small matrices
//!
//! Determinant and solve go through LU with partial pivoting, inversion
//! through Gauss-Jordan, plus Cholesky for SPD inputs and the usual matrix
//! norms. Inputs are 2-D candle tensors; internal arithmetic runs in `f64`
//! for stability and results come back as `f32`/`f32` tensors.
//!
//! Every contract violation is a typed [`LinAlgError`]. Singularity and
//! non-positive-definiteness are errors, not panics; a zero determinant is
//! a value, not an error.

use candle_core::{DType, Device, Tensor};
use thiserror::Error;

/// Pivot magnitudes below this (in the `f64` working precision) are
/// treated as singular.
const PIVOT_EPS: f64 = 1e-12;

#[derive(Debug, Error)]
pub enum LinAlgError {
    #[error("expected a 2-D matrix, got rank {0}")]
    NotTwoDim(usize),

    #[error("expected a square matrix, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is empty")]
    Empty,

    #[error("matrix contains non-finite values")]
    NonFinite,

    #[error("matrix is singular to working precision")]
    Singular,

    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("right-hand side must be 1-D, got rank {0}")]
    RhsNotVector(usize),

    #[error("right-hand side has {got} rows, matrix has {expected}")]
    RhsMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

/// Row-major `f64` working copy of a 2-D tensor.
struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    fn from_tensor(t: &Tensor) -> Result<Self, LinAlgError> {
        let dims = t.dims();
        if dims.len() != 2 {
            return Err(LinAlgError::NotTwoDim(dims.len()));
        }
        let (rows, cols) = (dims[0], dims[1]);
        if rows == 0 || cols == 0 {
            return Err(LinAlgError::Empty);
        }
        let data: Vec<f64> = t
            .to_dtype(DType::F64)?
            .flatten_all()?
            .to_vec1::<f64>()?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(LinAlgError::NonFinite);
        }
        Ok(Self { rows, cols, data })
    }

    fn square_from_tensor(t: &Tensor) -> Result<Self, LinAlgError> {
        let m = Self::from_tensor(t)?;
        if m.rows != m.cols {
            return Err(LinAlgError::NotSquare { rows: m.rows, cols: m.cols });
        }
        Ok(m)
    }

    fn at(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    fn at_mut(&mut self, r: usize, c: usize) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }
}

/// Determinant via LU with partial pivoting. Singular matrices yield 0.
pub fn det(t: &Tensor) -> Result<f32, LinAlgError> {
    let mut m = DenseMatrix::square_from_tensor(t)?;
    let n = m.rows;
    let mut sign = 1.0f64;
    let mut result = 1.0f64;
    for k in 0..n {
        let pivot_row = pivot_row(&m, k);
        let pivot = m.at(pivot_row, k);
        if pivot.abs() < PIVOT_EPS {
            return Ok(0.0);
        }
        if pivot_row != k {
            m.swap_rows(pivot_row, k);
            sign = -sign;
        }
        result *= m.at(k, k);
        eliminate_below(&mut m, k);
    }
    Ok((sign * result) as f32)
}

/// Solve `A x = b` for a 1-D right-hand side.
pub fn solve(a: &Tensor, b: &Tensor) -> Result<Tensor, LinAlgError> {
    let mut m = DenseMatrix::square_from_tensor(a)?;
    let n = m.rows;

    let b_dims = b.dims();
    if b_dims.len() != 1 {
        return Err(LinAlgError::RhsNotVector(b_dims.len()));
    }
    if b_dims[0] != n {
        return Err(LinAlgError::RhsMismatch { expected: n, got: b_dims[0] });
    }
    let mut rhs: Vec<f64> = b.to_dtype(DType::F64)?.to_vec1::<f64>()?;
    if rhs.iter().any(|v| !v.is_finite()) {
        return Err(LinAlgError::NonFinite);
    }

    // Forward elimination with the rhs carried along.
    for k in 0..n {
        let pr = pivot_row(&m, k);
        if m.at(pr, k).abs() < PIVOT_EPS {
            return Err(LinAlgError::Singular);
        }
        if pr != k {
            m.swap_rows(pr, k);
            rhs.swap(pr, k);
        }
        for r in (k + 1)..n {
            let factor = m.at(r, k) / m.at(k, k);
            for c in k..n {
                *m.at_mut(r, c) -= factor * m.at(k, c);
            }
            rhs[r] -= factor * rhs[k];
        }
    }

    // Back substitution.
    let mut x = vec![0.0f64; n];
    for k in (0..n).rev() {
        let mut acc = rhs[k];
        for c in (k + 1)..n {
            acc -= m.at(k, c) * x[c];
        }
        x[k] = acc / m.at(k, k);
    }

    let out: Vec<f32> = x.into_iter().map(|v| v as f32).collect();
    Ok(Tensor::from_vec(out, n, &Device::Cpu)?)
}

/// Inverse via Gauss-Jordan on `[A | I]`.
pub fn inverse(t: &Tensor) -> Result<Tensor, LinAlgError> {
    let m = DenseMatrix::square_from_tensor(t)?;
    let n = m.rows;
    let mut aug = DenseMatrix { rows: n, cols: 2 * n, data: vec![0.0; n * 2 * n] };
    for r in 0..n {
        for c in 0..n {
            *aug.at_mut(r, c) = m.at(r, c);
        }
        *aug.at_mut(r, n + r) = 1.0;
    }

    for k in 0..n {
        let pr = pivot_row(&aug, k);
        if aug.at(pr, k).abs() < PIVOT_EPS {
            return Err(LinAlgError::Singular);
        }
        aug.swap_rows(pr, k);
        let pivot = aug.at(k, k);
        for c in 0..2 * n {
            *aug.at_mut(k, c) /= pivot;
        }
        for r in 0..n {
            if r == k {
                continue;
            }
            let factor = aug.at(r, k);
            if factor == 0.0 {
                continue;
            }
            for c in 0..2 * n {
                let sub = factor * aug.at(k, c);
                *aug.at_mut(r, c) -= sub;
            }
        }
    }

    let mut out = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            out.push(aug.at(r, n + c) as f32);
        }
    }
    Ok(Tensor::from_vec(out, (n, n), &Device::Cpu)?)
}

/// Cholesky factor `L` (lower triangular, `A = L Lᵀ`).
///
/// Only the lower triangle of the input is read, LAPACK-style; the upper
/// triangle never participates.
pub fn cholesky(t: &Tensor) -> Result<Tensor, LinAlgError> {
    let m = DenseMatrix::square_from_tensor(t)?;
    let n = m.rows;
    let mut l = vec![0.0f64; n * n];
    for j in 0..n {
        let mut diag = m.at(j, j);
        for k in 0..j {
            diag -= l[j * n + k] * l[j * n + k];
        }
        if diag <= 0.0 {
            return Err(LinAlgError::NotPositiveDefinite);
        }
        let diag = diag.sqrt();
        l[j * n + j] = diag;
        for i in (j + 1)..n {
            let mut acc = m.at(i, j);
            for k in 0..j {
                acc -= l[i * n + k] * l[j * n + k];
            }
            l[i * n + j] = acc / diag;
        }
    }
    let out: Vec<f32> = l.into_iter().map(|v| v as f32).collect();
    Ok(Tensor::from_vec(out, (n, n), &Device::Cpu)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixNorm {
    Frobenius,
    One,
    Inf,
}

pub fn norm(t: &Tensor, which: MatrixNorm) -> Result<f32, LinAlgError> {
    let m = DenseMatrix::from_tensor(t)?;
    let value = match which {
        MatrixNorm::Frobenius => m.data.iter().map(|v| v * v).sum::<f64>().sqrt(),
        MatrixNorm::One => (0..m.cols)
            .map(|c| (0..m.rows).map(|r| m.at(r, c).abs()).sum::<f64>())
            .fold(0.0, f64::max),
        MatrixNorm::Inf => (0..m.rows)
            .map(|r| (0..m.cols).map(|c| m.at(r, c).abs()).sum::<f64>())
            .fold(0.0, f64::max),
    };
    Ok(value as f32)
}

fn pivot_row(m: &DenseMatrix, k: usize) -> usize {
    let mut best = k;
    for r in (k + 1)..m.rows {
        if m.at(r, k).abs() > m.at(best, k).abs() {
            best = r;
        }
    }
    best
}

fn eliminate_below(m: &mut DenseMatrix, k: usize) {
    for r in (k + 1)..m.rows {
        let factor = m.at(r, k) / m.at(k, k);
        if factor == 0.0 {
            continue;
        }
        for c in k..m.cols {
            let sub = factor * m.at(k, c);
            *m.at_mut(r, c) -= sub;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(data: &[f32], n: usize) -> Tensor {
        Tensor::from_slice(data, (n, n), &Device::Cpu).unwrap()
    }

    #[test]
    fn det_of_identity_is_one() {
        let eye = square(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], 3);
        assert_eq!(det(&eye).unwrap(), 1.0);
    }

    #[test]
    fn det_tracks_row_swaps() {
        // Permutation matrix with one swap: determinant -1.
        let p = square(&[0.0, 1.0, 1.0, 0.0], 2);
        assert_eq!(det(&p).unwrap(), -1.0);
    }

    #[test]
    fn det_of_singular_matrix_is_zero() {
        let s = square(&[1.0, 2.0, 2.0, 4.0], 2);
        assert_eq!(det(&s).unwrap(), 0.0);
    }

    #[test]
    fn solve_recovers_known_solution() {
        let a = square(&[3.0, 1.0, 1.0, 2.0], 2);
        let b = Tensor::from_slice(&[9.0f32, 8.0], 2, &Device::Cpu).unwrap();
        let x = solve(&a, &b).unwrap().to_vec1::<f32>().unwrap();
        assert!((x[0] - 2.0).abs() < 1e-5);
        assert!((x[1] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn solve_singular_is_a_typed_error() {
        let a = square(&[1.0, 2.0, 2.0, 4.0], 2);
        let b = Tensor::from_slice(&[1.0f32, 2.0], 2, &Device::Cpu).unwrap();
        assert!(matches!(solve(&a, &b), Err(LinAlgError::Singular)));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = square(&[4.0, 7.0, 2.0, 6.0], 2);
        let inv = inverse(&a).unwrap();
        let product = a.matmul(&inv).unwrap().to_vec2::<f32>().unwrap();
        for r in 0..2 {
            for c in 0..2 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((product[r][c] - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn cholesky_reconstructs_spd_input() {
        let a = square(&[4.0, 2.0, 2.0, 3.0], 2);
        let l = cholesky(&a).unwrap();
        let lt = l.t().unwrap();
        let back = l.matmul(&lt).unwrap().to_vec2::<f32>().unwrap();
        let orig = a.to_vec2::<f32>().unwrap();
        for r in 0..2 {
            for c in 0..2 {
                assert!((back[r][c] - orig[r][c]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn cholesky_rejects_indefinite_input() {
        let a = square(&[1.0, 0.0, 0.0, -1.0], 2);
        assert!(matches!(cholesky(&a), Err(LinAlgError::NotPositiveDefinite)));
    }

    #[test]
    fn shape_contracts_are_enforced() {
        let rect = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(det(&rect), Err(LinAlgError::NotSquare { .. })));

        let vec1 = Tensor::zeros(4, DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(det(&vec1), Err(LinAlgError::NotTwoDim(1))));

        let nan = square(&[f32::NAN, 0.0, 0.0, 1.0], 2);
        assert!(matches!(det(&nan), Err(LinAlgError::NonFinite)));
    }

    #[test]
    fn norms_match_hand_computation() {
        let a = square(&[1.0, -2.0, 3.0, -4.0], 2);
        assert!((norm(&a, MatrixNorm::Frobenius).unwrap() - 30.0f32.sqrt()).abs() < 1e-5);
        assert_eq!(norm(&a, MatrixNorm::One).unwrap(), 6.0);
        assert_eq!(norm(&a, MatrixNorm::Inf).unwrap(), 7.0);
    }
}
