// SPDX-License-Identifier: MIT OR Apache-2.0
//! Average and max pooling through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.pool2d";
pub const MIN_INPUT_LEN: usize = 12;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::UnsupportedDType,
    ErrorClass::GraphContract,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::float_from_selector(cur.read_u8());
    let take_max = cur.read_bool();

    let batch = cur.read_bounded_usize(1, 4);
    let channels = cur.read_bounded_usize(1, 4);
    let h = cur.read_bounded_usize(1, limits.max_dim);
    let w = cur.read_bounded_usize(1, limits.max_dim);
    let input = TensorDescriptor::from_shape(&mut cur, dtype, vec![batch, channels, h, w]);

    // Kernel and stride are decoded unclamped against the input so the
    // oversized-kernel rejection path stays reachable.
    let kernel = (cur.read_bounded_usize(1, 12), cur.read_bounded_usize(1, 12));
    let stride = (cur.read_bounded_usize(1, 4), cur.read_bounded_usize(1, 4));

    let device = super::device();
    let input_t = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let x = g.placeholder(dtype.to_dtype(), input.shape.clone());
    let pooled = if take_max {
        g.op(OpNode::MaxPool2d { input: x, kernel, stride })
    } else {
        g.op(OpNode::AvgPool2d { input: x, kernel, stride })
    };

    match Session::cpu().run(&g, &[(x, input_t)], &[pooled]) {
        Ok(outs) => {
            let expected_h = (h - kernel.0) / stride.0 + 1;
            let expected_w = (w - kernel.1) / stride.1 + 1;
            let dims = outs[0].dims();
            if dims != [batch, channels, expected_h, expected_w].as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "pooled {:?} into {:?}, expected [{batch}, {channels}, \
                         {expected_h}, {expected_w}]",
                        input.shape, dims
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
