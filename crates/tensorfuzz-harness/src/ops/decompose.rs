// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dense decompositions and norms through tensorfuzz-linalg.

use tensorfuzz_input::{ElementType, InputCursor, TensorDescriptor};
use tensorfuzz_linalg::{cholesky, det, inverse, norm, solve, MatrixNorm};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "linalg.decompose";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::LinAlgContract,
    ErrorClass::SingularMatrix,
    ErrorClass::NotPositiveDefinite,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let mut cur = InputCursor::new(data);

    let selector = cur.read_selector(6);
    let n = cur.read_bounded_usize(1, 8);
    let matrix = TensorDescriptor::from_shape(&mut cur, ElementType::F32, vec![n, n]);

    let device = super::device();
    let a = match matrix.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    match selector {
        0 => match det(&a) {
            // Zero is a value here, not a failure; nothing further to pin.
            Ok(_) => Outcome::Accepted,
            Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
        },
        1 => {
            let rhs = TensorDescriptor::from_shape(&mut cur, ElementType::F32, vec![n]);
            let b = match rhs.to_tensor(&device) {
                Ok(t) => t,
                Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
            };
            match solve(&a, &b) {
                Ok(x) => {
                    if x.dims() != [n].as_slice() {
                        return Outcome::anomaly(
                            OP,
                            format!("solve of {n}x{n} system returned {:?}", x.dims()),
                        );
                    }
                    Outcome::Accepted
                }
                Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
            }
        }
        2 => match inverse(&a) {
            Ok(inv) => {
                if inv.dims() != [n, n].as_slice() {
                    return Outcome::anomaly(OP, format!("inverse returned {:?}", inv.dims()));
                }
                Outcome::Accepted
            }
            Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
        },
        3 => match cholesky(&a) {
            Ok(l) => {
                // The factor must be lower triangular; this is the one
                // structural invariant the routine promises.
                let rows = match l.to_vec2::<f32>() {
                    Ok(r) => r,
                    Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
                };
                for (r, row) in rows.iter().enumerate() {
                    for (c, &v) in row.iter().enumerate() {
                        if c > r && v != 0.0 {
                            return Outcome::anomaly(
                                OP,
                                format!("cholesky factor has {v} above the diagonal at ({r},{c})"),
                            );
                        }
                    }
                }
                Outcome::Accepted
            }
            Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
        },
        4 => match norm(&a, MatrixNorm::Frobenius) {
            Ok(v) => {
                if v.is_nan() || v < 0.0 {
                    return Outcome::anomaly(OP, format!("frobenius norm came back as {v}"));
                }
                Outcome::Accepted
            }
            Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
        },
        _ => {
            let which = if cur.read_bool() { MatrixNorm::One } else { MatrixNorm::Inf };
            match norm(&a, which) {
                Ok(v) => {
                    if v.is_nan() || v < 0.0 {
                        return Outcome::anomaly(OP, format!("{which:?} norm came back as {v}"));
                    }
                    Outcome::Accepted
                }
                Err(e) => classify::linalg_outcome(OP, EXPECTED, &e),
            }
        }
    }
}
