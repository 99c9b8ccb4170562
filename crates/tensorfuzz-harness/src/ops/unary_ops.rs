// SPDX-License-Identifier: MIT OR Apache-2.0
//! Direct elementwise unary ops on tensors.

use candle_core::Tensor;
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "direct.unary";
pub const MIN_INPUT_LEN: usize = 6;

const EXPECTED: &[ErrorClass] = &[ErrorClass::UnsupportedDType, ErrorClass::DTypeMismatch];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let selector = cur.read_selector(10);
    let dtype = ElementType::from_selector(cur.read_u8());
    let input = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);

    let device = super::device();
    let x = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let result: candle_core::Result<Tensor> = match selector {
        0 => x.neg(),
        1 => x.abs(),
        2 => x.exp(),
        3 => x.log(),
        4 => x.sqrt(),
        5 => x.sqr(),
        6 => x.sin(),
        7 => x.cos(),
        8 => x.tanh(),
        _ => x.relu(),
    };

    match result {
        Ok(out) => {
            // Unary ops are shape- and dtype-preserving; values may be
            // NaN/Inf (log of a negative, exp overflow) and that is fine.
            if out.dims() != input.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("unary op {selector} changed shape {:?} to {:?}", input.shape, out.dims()),
                );
            }
            if out.dtype() != dtype.to_dtype() {
                return Outcome::anomaly(
                    OP,
                    format!("unary op {selector} changed dtype to {:?}", out.dtype()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
