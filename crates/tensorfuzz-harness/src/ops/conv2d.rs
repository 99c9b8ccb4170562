// SPDX-License-Identifier: MIT OR Apache-2.0
//! 2-D convolution through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.conv2d";
pub const MIN_INPUT_LEN: usize = 16;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
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

    // Input is (batch, channels, h, w); the kernel decodes its per-group
    // channel count independently so group mismatches stay reachable.
    let batch = cur.read_bounded_usize(1, 4);
    let groups = cur.read_bounded_usize(1, 2);
    let c_per_group = cur.read_bounded_usize(1, 3);
    let h = cur.read_bounded_usize(1, limits.max_dim);
    let w = cur.read_bounded_usize(1, limits.max_dim);
    let input =
        TensorDescriptor::from_shape(&mut cur, dtype, vec![batch, groups * c_per_group, h, w]);

    let c_out = groups * cur.read_bounded_usize(1, 3);
    let k_in = cur.read_bounded_usize(1, 3);
    let kh = cur.read_bounded_usize(1, 5);
    let kw = cur.read_bounded_usize(1, 5);
    let kernel = TensorDescriptor::from_shape(&mut cur, dtype, vec![c_out, k_in, kh, kw]);

    let padding = cur.read_bounded_usize(0, 2);
    let stride = cur.read_bounded_usize(1, 3);
    let dilation = cur.read_bounded_usize(1, 2);

    let device = super::device();
    let input_t = match input.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let kernel_t = match kernel.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let x = g.placeholder(dtype.to_dtype(), input.shape.clone());
    let k = g.placeholder(dtype.to_dtype(), kernel.shape.clone());
    let conv = g.op(OpNode::Conv2d { input: x, kernel: k, padding, stride, dilation, groups });

    match Session::cpu().run(&g, &[(x, input_t), (k, kernel_t)], &[conv]) {
        Ok(outs) => {
            let expected_h = (h + 2 * padding - dilation * (kh - 1) - 1) / stride + 1;
            let expected_w = (w + 2 * padding - dilation * (kw - 1) - 1) / stride + 1;
            let dims = outs[0].dims();
            if dims != [batch, c_out, expected_h, expected_w].as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!(
                        "output {:?}, expected [{batch}, {c_out}, {expected_h}, {expected_w}]",
                        dims
                    ),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
