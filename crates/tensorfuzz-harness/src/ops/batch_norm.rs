// SPDX-License-Identifier: MIT OR Apache-2.0
//! Global-normalization batch norm through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.batch_norm";
pub const MIN_INPUT_LEN: usize = 16;

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
    let epsilon = 1e-5 * (1.0 + cur.read_u8() as f64);

    // Channels-last layout: statistics broadcast along the trailing dim.
    let batch = cur.read_bounded_usize(1, 4);
    let rows = cur.read_bounded_usize(1, limits.max_dim);
    let cols = cur.read_bounded_usize(1, limits.max_dim);
    let channels = cur.read_bounded_usize(1, 6);
    let input =
        TensorDescriptor::from_shape(&mut cur, dtype, vec![batch, rows, cols, channels]);

    // Parameter extent decoded independently; a mismatch is an expected
    // broadcast rejection, not an anomaly.
    let param_dim = cur.read_bounded_usize(1, 6);
    let mean = TensorDescriptor::from_shape(&mut cur, dtype, vec![param_dim]);
    let variance = TensorDescriptor::from_shape(&mut cur, dtype, vec![param_dim]);
    let scale = TensorDescriptor::from_shape(&mut cur, dtype, vec![param_dim]);
    let offset = TensorDescriptor::from_shape(&mut cur, dtype, vec![param_dim]);

    let device = super::device();
    let tensors: Result<Vec<_>, _> = [&input, &mean, &variance, &scale, &offset]
        .iter()
        .map(|d| d.to_tensor(&device))
        .collect();
    let tensors = match tensors {
        Ok(ts) => ts,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let x = g.placeholder(dtype.to_dtype(), input.shape.clone());
    let m = g.placeholder(dtype.to_dtype(), mean.shape.clone());
    let v = g.placeholder(dtype.to_dtype(), variance.shape.clone());
    let gamma = g.placeholder(dtype.to_dtype(), scale.shape.clone());
    let beta = g.placeholder(dtype.to_dtype(), offset.shape.clone());
    let bn = g.op(OpNode::BatchNorm {
        input: x,
        mean: m,
        variance: v,
        scale: gamma,
        offset: beta,
        epsilon,
    });

    let feeds: Vec<_> = [x, m, v, gamma, beta]
        .into_iter()
        .zip(tensors)
        .collect();
    match Session::cpu().run(&g, &feeds, &[bn]) {
        Ok(outs) => {
            // Normalization is elementwise over the input; values may be
            // NaN (negative variance), but the shape is pinned.
            if outs[0].dims() != input.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("normalized {:?} into {:?}", input.shape, outs[0].dims()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
