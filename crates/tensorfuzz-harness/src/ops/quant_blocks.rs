// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block quantization round trip through tensorfuzz-quant.

use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};
use tensorfuzz_quant::{quantize, QuantScheme};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "quant.block_roundtrip";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] =
    &[ErrorClass::QuantContract, ErrorClass::UnsupportedDType, ErrorClass::DTypeMismatch];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let scheme = if cur.read_bool() { QuantScheme::AffineU8 } else { QuantScheme::SymmetricI8 };
    // Zero stays reachable so the block-size contract check is exercised.
    let block_size = cur.read_bounded_usize(0, 64);
    let dtype = ElementType::float_from_selector(cur.read_u8());
    let input = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);

    let device = super::device();
    let x = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let q = match quantize(&x, scheme, block_size) {
        Ok(q) => q,
        Err(e) => return classify::quant_outcome(OP, EXPECTED, &e),
    };
    let back = match q.dequantize(&device) {
        Ok(t) => t,
        Err(e) => return classify::quant_outcome(OP, EXPECTED, &e),
    };

    if back.dims() != input.shape.as_slice() {
        return Outcome::anomaly(
            OP,
            format!("round trip changed shape {:?} to {:?}", input.shape, back.dims()),
        );
    }

    // Inputs that survive quantization are finite, so the per-element error
    // bound is checkable.
    let original = match x
        .flatten_all()
        .and_then(|t| t.to_dtype(candle_core::DType::F32)?.to_vec1::<f32>())
    {
        Ok(v) => v,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let recovered = match back.flatten_all().and_then(|t| t.to_vec1::<f32>()) {
        Ok(v) => v,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let bound = q.max_step() * 1.01 + 1e-6;
    for (i, (a, b)) in original.iter().zip(&recovered).enumerate() {
        if (a - b).abs() > bound {
            return Outcome::anomaly(
                OP,
                format!("element {i}: |{a} - {b}| exceeds quantization step {bound}"),
            );
        }
    }
    Outcome::Accepted
}
