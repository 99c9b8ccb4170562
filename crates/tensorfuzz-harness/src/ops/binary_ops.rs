// SPDX-License-Identifier: MIT OR Apache-2.0
//! Direct elementwise binary ops on tensors, no graph.

use candle_core::Tensor;
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "direct.binary";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
    ErrorClass::UnsupportedDType,
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
}

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let kind = match cur.read_selector(6) {
        0 => Kind::Add,
        1 => Kind::Sub,
        2 => Kind::Mul,
        3 => Kind::Div,
        4 => Kind::Maximum,
        _ => Kind::Minimum,
    };
    // Integer division by a fuzzed zero is a hard fault, not a recoverable
    // rejection, so division sticks to float dtypes.
    let raw = cur.read_u8();
    let dtype = if kind == Kind::Div {
        ElementType::float_from_selector(raw)
    } else {
        ElementType::from_selector(raw)
    };
    let broadcast = cur.read_bool();

    let lhs = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let rhs = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);

    let device = super::device();
    let (a, b) = match (lhs.to_tensor(&device), rhs.to_tensor(&device)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let result: candle_core::Result<Tensor> = if broadcast {
        match kind {
            Kind::Add => a.broadcast_add(&b),
            Kind::Sub => a.broadcast_sub(&b),
            Kind::Mul => a.broadcast_mul(&b),
            Kind::Div => a.broadcast_div(&b),
            Kind::Maximum => a.broadcast_maximum(&b),
            Kind::Minimum => a.broadcast_minimum(&b),
        }
    } else {
        match kind {
            Kind::Add => a.add(&b),
            Kind::Sub => a.sub(&b),
            Kind::Mul => a.mul(&b),
            Kind::Div => a.div(&b),
            Kind::Maximum => a.maximum(&b),
            Kind::Minimum => a.minimum(&b),
        }
    };

    match result {
        Ok(out) => {
            if !broadcast && out.dims() != lhs.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("elementwise op changed shape {:?} to {:?}", lhs.shape, out.dims()),
                );
            }
            if out.dtype() != dtype.to_dtype() {
                return Outcome::anomaly(
                    OP,
                    format!("op changed dtype {:?} to {:?}", dtype.to_dtype(), out.dtype()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
