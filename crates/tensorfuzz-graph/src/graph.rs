// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph construction: nodes, op kinds, typed attributes.

use candle_core::{DType, Tensor};

/// Index of a node within its graph, topological by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    /// Build an id from a raw index. Ids that were never handed out by the
    /// graph simply fail resolution with `UnknownNode`, which makes this
    /// the hook for probing fetch validation.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    Neg,
    Abs,
    Exp,
    Log,
    Sqrt,
    Sqr,
    Sin,
    Cos,
    Tanh,
    Relu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceKind {
    Sum,
    Mean,
    Max,
    Min,
}

/// An operation node: kind, input node ids, and typed attributes.
#[derive(Debug, Clone)]
pub enum OpNode {
    Binary { kind: BinaryKind, lhs: NodeId, rhs: NodeId, broadcast: bool },
    Unary { kind: UnaryKind, input: NodeId },
    MatMul { lhs: NodeId, rhs: NodeId },
    Conv2d {
        input: NodeId,
        kernel: NodeId,
        padding: usize,
        stride: usize,
        dilation: usize,
        groups: usize,
    },
    AvgPool2d { input: NodeId, kernel: (usize, usize), stride: (usize, usize) },
    MaxPool2d { input: NodeId, kernel: (usize, usize), stride: (usize, usize) },
    /// Global-normalization batch norm: `(x - mean) / sqrt(var + eps) * scale + offset`.
    BatchNorm {
        input: NodeId,
        mean: NodeId,
        variance: NodeId,
        scale: NodeId,
        offset: NodeId,
        epsilon: f64,
    },
    Softmax { input: NodeId, dim: usize },
    Reduce { kind: ReduceKind, input: NodeId, dims: Vec<usize>, keep_dims: bool },
    Concat { inputs: Vec<NodeId>, axis: usize },
    Narrow { input: NodeId, dim: usize, start: usize, len: usize },
    Transpose { input: NodeId, dim1: usize, dim2: usize },
    Reshape { input: NodeId, shape: Vec<usize> },
    /// One fused Adam step; evaluates to the updated `var`.
    AdamUpdate {
        var: NodeId,
        m: NodeId,
        v: NodeId,
        beta1_power: NodeId,
        beta2_power: NodeId,
        lr: NodeId,
        beta1: NodeId,
        beta2: NodeId,
        epsilon: NodeId,
        grad: NodeId,
        use_nesterov: bool,
    },
}

impl OpNode {
    /// Ids this op reads, in argument order.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            OpNode::Binary { lhs, rhs, .. } | OpNode::MatMul { lhs, rhs } => vec![*lhs, *rhs],
            OpNode::Unary { input, .. }
            | OpNode::AvgPool2d { input, .. }
            | OpNode::MaxPool2d { input, .. }
            | OpNode::Softmax { input, .. }
            | OpNode::Reduce { input, .. }
            | OpNode::Narrow { input, .. }
            | OpNode::Transpose { input, .. }
            | OpNode::Reshape { input, .. } => vec![*input],
            OpNode::Conv2d { input, kernel, .. } => vec![*input, *kernel],
            OpNode::BatchNorm { input, mean, variance, scale, offset, .. } => {
                vec![*input, *mean, *variance, *scale, *offset]
            }
            OpNode::Concat { inputs, .. } => inputs.clone(),
            OpNode::AdamUpdate {
                var,
                m,
                v,
                beta1_power,
                beta2_power,
                lr,
                beta1,
                beta2,
                epsilon,
                grad,
                ..
            } => vec![
                *var,
                *m,
                *v,
                *beta1_power,
                *beta2_power,
                *lr,
                *beta1,
                *beta2,
                *epsilon,
                *grad,
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    /// Declared input slot: the session resolves it against a feed.
    Placeholder { dtype: DType, shape: Vec<usize> },
    /// Tensor baked into the graph at construction time.
    Constant(Tensor),
    Op(OpNode),
}

/// An append-only operation graph.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn placeholder(&mut self, dtype: DType, shape: Vec<usize>) -> NodeId {
        self.push(Node::Placeholder { dtype, shape })
    }

    pub fn constant(&mut self, tensor: Tensor) -> NodeId {
        self.push(Node::Constant(tensor))
    }

    /// Append an op node. Inputs must already exist; ids are only handed
    /// out by this graph, so a violation is a harness bug.
    pub fn op(&mut self, op: OpNode) -> NodeId {
        debug_assert!(
            op.inputs().iter().all(|id| id.0 < self.nodes.len()),
            "op references a node that is not in the graph yet"
        );
        self.push(Node::Op(op))
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_insertion_ordered() {
        let mut g = Graph::new();
        let a = g.placeholder(DType::F32, vec![2]);
        let b = g.placeholder(DType::F32, vec![2]);
        let sum = g.op(OpNode::Binary { kind: BinaryKind::Add, lhs: a, rhs: b, broadcast: false });
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(sum.index(), 2);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn op_inputs_cover_every_operand() {
        let mut g = Graph::new();
        let x = g.placeholder(DType::F32, vec![1, 1, 4, 4]);
        let k = g.placeholder(DType::F32, vec![1, 1, 2, 2]);
        let conv = OpNode::Conv2d { input: x, kernel: k, padding: 0, stride: 1, dilation: 1, groups: 1 };
        assert_eq!(conv.inputs(), vec![x, k]);
        let cat = OpNode::Concat { inputs: vec![x, k], axis: 0 };
        assert_eq!(cat.inputs(), vec![x, k]);
    }
}
