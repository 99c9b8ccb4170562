// SPDX-License-Identifier: MIT OR Apache-2.0
//! Matrix product through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.matmul";
pub const MIN_INPUT_LEN: usize = 8;

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

    let dtype = ElementType::from_selector(cur.read_u8());
    let lhs = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let rhs = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);

    let device = super::device();
    let lhs_t = match lhs.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let rhs_t = match rhs.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let a = g.placeholder(dtype.to_dtype(), lhs.shape.clone());
    let b = g.placeholder(dtype.to_dtype(), rhs.shape.clone());
    let mm = g.op(OpNode::MatMul { lhs: a, rhs: b });

    match Session::cpu().run(&g, &[(a, lhs_t), (b, rhs_t)], &[mm]) {
        Ok(outs) => {
            // For plain 2-D inputs with agreeing inner dims the contracted
            // shape is fully determined; anything else is an anomaly.
            if lhs.rank() == 2 && rhs.rank() == 2 && lhs.shape[1] == rhs.shape[0] {
                let dims = outs[0].dims();
                if dims.len() != 2 || dims[0] != lhs.shape[0] || dims[1] != rhs.shape[1] {
                    return Outcome::anomaly(
                        OP,
                        format!(
                            "contracted {:?} x {:?} into {:?}",
                            lhs.shape, rhs.shape, dims
                        ),
                    );
                }
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
