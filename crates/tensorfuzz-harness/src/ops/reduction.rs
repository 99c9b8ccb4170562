// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axis reductions (sum, mean, max, min) through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, ReduceKind, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.reduce";
pub const MIN_INPUT_LEN: usize = 8;

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

    let kind = match cur.read_selector(4) {
        0 => ReduceKind::Sum,
        1 => ReduceKind::Mean,
        2 => ReduceKind::Max,
        _ => ReduceKind::Min,
    };
    // Mean divides by the reduced extent, which only makes sense on floats.
    let dtype = if kind == ReduceKind::Mean {
        ElementType::float_from_selector(cur.read_u8())
    } else {
        ElementType::from_selector(cur.read_u8())
    };
    let keep_dims = cur.read_bool();

    let input = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let rank = input.rank();

    let dim_count = cur.read_bounded_usize(0, rank.max(1));
    let mut dims = Vec::with_capacity(dim_count);
    for _ in 0..dim_count {
        dims.push(cur.read_selector(rank.max(1)));
    }
    // Reducing the same axis twice is shorthand for reducing it once.
    dims.sort_unstable();
    dims.dedup();

    let device = super::device();
    let input_t = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let x = g.placeholder(dtype.to_dtype(), input.shape.clone());
    let reduced = g.op(OpNode::Reduce { kind, input: x, dims: dims.clone(), keep_dims });

    match Session::cpu().run(&g, &[(x, input_t)], &[reduced]) {
        Ok(outs) => {
            // Dims were decoded modulo the rank, so for rank > 0 they are
            // all in range and the output rank is fully determined.
            let expected_rank = if keep_dims { rank } else { rank.saturating_sub(dims.len()) };
            if rank > 0 && outs[0].rank() != expected_rank {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "{kind:?} over {dims:?} turned rank {rank} into rank {} \
                         (keep_dims={keep_dims})",
                        outs[0].rank()
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
