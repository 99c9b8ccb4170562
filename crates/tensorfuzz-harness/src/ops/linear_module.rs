// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear module forward pass, direct call.

use candle_nn::{Linear, Module};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "module.linear";
pub const MIN_INPUT_LEN: usize = 10;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
    ErrorClass::UnsupportedDType,
    ErrorClass::MatMulContract,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::float_from_selector(cur.read_u8());
    let with_bias = cur.read_bool();

    let out_features = cur.read_bounded_usize(1, 8);
    let in_features = cur.read_bounded_usize(1, 8);
    let weight = TensorDescriptor::from_shape(&mut cur, dtype, vec![out_features, in_features]);
    let bias = with_bias
        .then(|| TensorDescriptor::from_shape(&mut cur, dtype, vec![out_features]));

    let batch = cur.read_bounded_usize(1, 4);
    // Activation width decoded on its own; disagreements belong to the
    // library's matmul validation.
    let width = cur.read_bounded_usize(1, 8);
    let input = TensorDescriptor::from_shape(&mut cur, dtype, vec![batch, width]);

    let device = super::device();
    let w = match weight.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let b = match bias.as_ref().map(|d| d.to_tensor(&device)).transpose() {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let x = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let layer = Linear::new(w, b);
    match layer.forward(&x) {
        Ok(out) => {
            if out.dims() != [batch, out_features].as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "linear [{batch}, {width}] x [{out_features}, {in_features}] \
                         gave {:?}",
                        out.dims()
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
