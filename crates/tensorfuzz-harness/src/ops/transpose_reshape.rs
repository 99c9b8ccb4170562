// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transpose followed by reshape, through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{descriptor, ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.transpose_reshape";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] =
    &[ErrorClass::ShapeMismatch, ErrorClass::UnsupportedDType, ErrorClass::InvalidIndex];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::from_selector(cur.read_u8());
    let input = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let rank = input.rank();

    let dim1 = cur.read_selector(rank.max(1));
    let dim2 = cur.read_selector(rank.max(1));

    // Reshape target decoded independently; a mismatched element count is
    // the library's rejection to make.
    let target_rank = cur.read_bounded_u8(0, limits.max_rank as u8) as usize;
    let target = descriptor::decode_shape(&mut cur, &limits, target_rank);

    let device = super::device();
    let input_t = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let x = g.placeholder(dtype.to_dtype(), input.shape.clone());
    let swapped = g.op(OpNode::Transpose { input: x, dim1, dim2 });
    let reshaped = g.op(OpNode::Reshape { input: swapped, shape: target.clone() });

    match Session::cpu().run(&g, &[(x, input_t)], &[swapped, reshaped]) {
        Ok(outs) => {
            if rank > 0 {
                let dims = outs[0].dims();
                if dims[dim1] != input.shape[dim2] || dims[dim2] != input.shape[dim1] {
                    return Outcome::anomaly(
                        OP,
                        format!(
                            "transpose({dim1}, {dim2}) turned {:?} into {:?}",
                            input.shape, dims
                        ),
                    );
                }
            }
            if outs[1].dims() != target.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("reshape produced {:?}, wanted {:?}", outs[1].dims(), target),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
