// SPDX-License-Identifier: MIT OR Apache-2.0
//! A decoded chain of elementwise ops, to exercise the session on graphs
//! deeper than one node.

use tensorfuzz_graph::{BinaryKind, Graph, OpNode, Session, UnaryKind};
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "graph.chained_ops";
pub const MIN_INPUT_LEN: usize = 12;

const EXPECTED: &[ErrorClass] = &[
    ErrorClass::ShapeMismatch,
    ErrorClass::DTypeMismatch,
    ErrorClass::UnsupportedDType,
];

const UNARY: [UnaryKind; 8] = [
    UnaryKind::Neg,
    UnaryKind::Abs,
    UnaryKind::Exp,
    UnaryKind::Sqrt,
    UnaryKind::Sqr,
    UnaryKind::Sin,
    UnaryKind::Tanh,
    UnaryKind::Relu,
];

const BINARY: [BinaryKind; 5] = [
    BinaryKind::Add,
    BinaryKind::Sub,
    BinaryKind::Mul,
    BinaryKind::Maximum,
    BinaryKind::Minimum,
];

pub fn run(data: &[u8]) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let dtype = ElementType::float_from_selector(cur.read_u8());
    let seed = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);
    let second = TensorDescriptor::decode_with_dtype(&mut cur, &limits, dtype);

    let device = super::device();
    let seed_t = match seed.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let second_t = match second.to_tensor(&device) {
        Ok(t) => t,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };

    let mut g = Graph::new();
    let a = g.placeholder(dtype.to_dtype(), seed.shape.clone());
    let b = g.placeholder(dtype.to_dtype(), second.shape.clone());
    let mut pool = vec![a, b];

    let steps = cur.read_bounded_usize(1, 6);
    for _ in 0..steps {
        let node = if cur.read_bool() {
            let kind = BINARY[cur.read_selector(BINARY.len())];
            let lhs = pool[cur.read_selector(pool.len())];
            let rhs = pool[cur.read_selector(pool.len())];
            g.op(OpNode::Binary { kind, lhs, rhs, broadcast: cur.read_bool() })
        } else {
            let kind = UNARY[cur.read_selector(UNARY.len())];
            let input = pool[cur.read_selector(pool.len())];
            g.op(OpNode::Unary { kind, input })
        };
        pool.push(node);
    }
    let fetch = *pool.last().expect("pool starts non-empty");

    match Session::cpu().run(&g, &[(a, seed_t), (b, second_t)], &[fetch]) {
        Ok(outs) => {
            if outs.len() != 1 {
                return Outcome::anomaly(OP, format!("fetched {} values, wanted 1", outs.len()));
            }
            Outcome::Accepted
        }
        Err(e) => classify::graph_outcome(OP, EXPECTED, &e),
    }
}
