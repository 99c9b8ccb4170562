// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concatenation followed by a narrow slice, through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.concat_slice";
pub const MIN_INPUT_LEN: usize = 10;

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
    let count = cur.read_bounded_usize(1, 3);

    // Tensors decode independently: agreeing shapes concatenate, the rest
    // exercise the library's cat validation.
    let mut descs = Vec::with_capacity(count);
    for _ in 0..count {
        descs.push(TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype));
    }
    let axis = cur.read_selector(descs[0].rank().max(1));

    // Slice parameters over the concat result, unclamped on purpose.
    let narrow_dim = cur.read_selector(descs[0].rank().max(1));
    let narrow_start = cur.read_bounded_usize(0, limits.max_dim * 3);
    let narrow_len = cur.read_bounded_usize(1, limits.max_dim);

    let device = super::device();
    let mut g = Graph::new();
    let mut feeds = Vec::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    for desc in &descs {
        let t = match desc.to_tensor(&device) {
            Ok(t) => t,
            Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
        };
        let id = g.placeholder(dtype.to_dtype(), desc.shape.clone());
        feeds.push((id, t));
        ids.push(id);
    }
    let cat = g.op(OpNode::Concat { inputs: ids, axis });
    let sliced = g.op(OpNode::Narrow {
        input: cat,
        dim: narrow_dim,
        start: narrow_start,
        len: narrow_len,
    });

    match Session::cpu().run(&g, &feeds, &[cat, sliced]) {
        Ok(outs) => {
            let cat_out = &outs[0];
            if cat_out.rank() != descs[0].rank() {
                return Outcome::anomaly(
                    OP,
                    format!("concat changed rank {} to {}", descs[0].rank(), cat_out.rank()),
                );
            }
            if outs[1].dims().get(narrow_dim).copied() != Some(narrow_len)
                && descs[0].rank() > 0
            {
                return Outcome::anomaly(
                    OP,
                    format!("narrow produced {:?}, wanted extent {narrow_len}", outs[1].dims()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
