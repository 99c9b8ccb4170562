// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fused Adam step through the graph layer.

use tensorfuzz_graph::{Graph, OpNode, Session};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.adam_update";
pub const MIN_INPUT_LEN: usize = 20;

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

    // var decides the shape; the moments and gradient share it, the
    // hyper-parameters are scalars. Raw float bytes mean the step routinely
    // sees zero or negative betas — that is the search space.
    let var = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let m = TensorDescriptor::from_shape(&mut cur, dtype, var.shape.clone());
    let v = TensorDescriptor::from_shape(&mut cur, dtype, var.shape.clone());
    let beta1_power = TensorDescriptor::scalar(&mut cur, dtype);
    let beta2_power = TensorDescriptor::scalar(&mut cur, dtype);
    let lr = TensorDescriptor::scalar(&mut cur, dtype);
    let beta1 = TensorDescriptor::scalar(&mut cur, dtype);
    let beta2 = TensorDescriptor::scalar(&mut cur, dtype);
    let epsilon = TensorDescriptor::scalar(&mut cur, dtype);
    let grad = TensorDescriptor::from_shape(&mut cur, dtype, var.shape.clone());

    let _use_locking = cur.read_bool();
    let use_nesterov = cur.read_bool();

    let device = super::device();
    let descs = [
        &var,
        &m,
        &v,
        &beta1_power,
        &beta2_power,
        &lr,
        &beta1,
        &beta2,
        &epsilon,
        &grad,
    ];
    let mut tensors = Vec::with_capacity(descs.len());
    for desc in descs {
        match desc.to_tensor(&device) {
            Ok(t) => tensors.push(t),
            Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
        }
    }

    let mut g = Graph::new();
    let ids: Vec<_> = descs
        .iter()
        .map(|d| g.placeholder(dtype.to_dtype(), d.shape.clone()))
        .collect();
    let updated = g.op(OpNode::AdamUpdate {
        var: ids[0],
        m: ids[1],
        v: ids[2],
        beta1_power: ids[3],
        beta2_power: ids[4],
        lr: ids[5],
        beta1: ids[6],
        beta2: ids[7],
        epsilon: ids[8],
        grad: ids[9],
        use_nesterov,
    });

    let feeds: Vec<_> = ids.into_iter().zip(tensors).collect();
    match Session::cpu().run(&g, &feeds, &[updated]) {
        Ok(outs) => {
            if outs[0].dims() != var.shape.as_slice() {
                return Outcome::anomaly(
                    OP,
                    format!("update changed var shape {:?} to {:?}", var.shape, outs[0].dims()),
                );
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
