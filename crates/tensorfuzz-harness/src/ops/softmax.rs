// SPDX-License-Identifier: MIT OR Apache-2.0
//! Softmax along a decoded axis, direct call.

use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "direct.softmax";
pub const MIN_INPUT_LEN: usize = 6;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::UnsupportedDType,
    ErrorClass::InvalidIndex,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::float_from_selector(cur.read_u8());
    let input = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let dim = cur.read_selector(input.rank().max(1));

    let device = super::device();
    let x = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    match candle_nn::ops::softmax(&x, dim) {
        Ok(out) => {
            if out.dims() != input.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("softmax changed shape {:?} to {:?}", input.shape, out.dims()),
                );
            }
            // For finite f32 input every slice along `dim` sums to one.
            if input.dtype == ElementType::F32
                && input.rank() > 0
                && input.elements::<f32>().iter().all(|v| v.is_finite())
            {
                let sums = match out.sum(dim).and_then(|s| s.flatten_all()?.to_vec1::<f32>()) {
                    Ok(s) => s,
                    Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
                };
                for s in sums {
                    if (s - 1.0).abs() > 1e-3 {
                        return Outcome::anomaly(OP, format!("slice summed to {s}, wanted ~1"));
                    }
                }
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
