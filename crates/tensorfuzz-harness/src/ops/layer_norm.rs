// SPDX-License-Identifier: MIT OR Apache-2.0
//! LayerNorm module forward pass, direct call.

use candle_nn::{LayerNorm, Module};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "module.layer_norm";
pub const MIN_INPUT_LEN: usize = 10;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
    ErrorClass::UnsupportedDType,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::float_from_selector(cur.read_u8());
    let eps = 1e-5 * (1.0 + cur.read_u8() as f64);

    let hidden = cur.read_bounded_usize(1, 16);
    let weight = TensorDescriptor::from_shape(&mut cur, dtype, vec![hidden]);
    let bias = TensorDescriptor::from_shape(&mut cur, dtype, vec![hidden]);

    // The activation decodes its trailing extent independently, so the
    // module's hidden-size check stays exercised.
    let batch = cur.read_bounded_usize(1, 8);
    let trailing = cur.read_bounded_usize(1, 16);
    let input = TensorDescriptor::from_shape(&mut cur, dtype, vec![batch, trailing]);

    let device = super::device();
    let (w, b, x) = match (
        weight.to_tensor(&device),
        bias.to_tensor(&device),
        input.to_tensor(&device),
    ) {
        (Ok(w), Ok(b), Ok(x)) => (w, b, x),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            return classify::candle_outcome(OP, EXPECTED, &e)
        }
    };

    let layer = LayerNorm::new(w, b, eps);
    match layer.forward(&x) {
        Ok(out) => {
            if out.dims() != input.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("layer norm changed shape {:?} to {:?}", input.shape, out.dims()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
