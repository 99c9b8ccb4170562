// SPDX-License-Identifier: MIT OR Apache-2.0
//! GGML block quantization via the tensor library's quantized module.

use candle_core::quantized::{GgmlDType, QTensor};
use tensorfuzz_input::{descriptor, ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "quant.ggml_blocks";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::QuantContract,
    ErrorClass::ShapeMismatch,
    ErrorClass::UnsupportedDType,
    ErrorClass::Other,
];

const DTYPES: [GgmlDType; 8] = [
    GgmlDType::F32,
    GgmlDType::F16,
    GgmlDType::Q4_0,
    GgmlDType::Q4_1,
    GgmlDType::Q5_0,
    GgmlDType::Q5_1,
    GgmlDType::Q8_0,
    GgmlDType::Q8_1,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let gdtype = DTYPES[cur.read_selector(DTYPES.len())];
    // Rank at least one: block formats key off the trailing extent. Plain
    // decoded extents are almost never divisible by the 32-element block,
    // which covers the rejection path; the widen flag stretches the
    // trailing extent to a block multiple so the quantize path runs too.
    let rank = cur.read_bounded_u8(1, 2) as usize;
    let widen = cur.read_bool();
    let mut shape = descriptor::decode_shape(&mut cur, &limits, rank);
    if widen {
        if let Some(last) = shape.last_mut() {
            *last *= 32;
        }
    }
    let input = TensorDescriptor::from_shape(&mut cur, ElementType::F32, shape);

    let device = super::device();
    let x = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let q = match QTensor::quantize(&x, gdtype) {
        Ok(q) => q,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    match q.dequantize(&device) {
        Ok(back) => {
            if back.dims() != input.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "{gdtype:?} round trip changed shape {:?} to {:?}",
                        input.shape,
                        back.dims()
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
