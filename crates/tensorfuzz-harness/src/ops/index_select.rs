// SPDX-License-Identifier: MIT OR Apache-2.0
//! Embedding-style row lookup via index_select, direct call.

use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "direct.index_select";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
    ErrorClass::UnsupportedDType,
    ErrorClass::InvalidIndex,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::from_selector(cur.read_u8());
    let source = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let dim = cur.read_selector(source.rank().max(1));

    // Indices are raw u32 bytes, deliberately unclamped: out-of-range rows
    // must come back as the library's own index rejection.
    let count = cur.read_bounded_usize(1, 16);
    let indices = TensorDescriptor::from_shape(&mut cur, ElementType::U32, vec![count]);

    let device = super::device();
    let src = match source.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let ids = match indices.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    match src.index_select(&ids, dim) {
        Ok(out) => {
            if source.rank() > 0 && out.dims().get(dim).copied() != Some(count) {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "selected {count} rows along dim {dim} of {:?}, got {:?}",
                        source.shape,
                        out.dims()
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::candle_outcome(OP, EXPECTED, &e),
    }
}
