// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-pass graph evaluation with feeds and fetches.

use candle_core::{Device, Tensor};

use crate::error::GraphError;
use crate::graph::{BinaryKind, Graph, Node, NodeId, OpNode, ReduceKind, UnaryKind};

/// Executes a [`Graph`] on one device. Sessions hold no state between
/// `run` calls; each call materializes every node value afresh.
#[derive(Debug, Clone)]
pub struct Session {
    device: Device,
}

impl Session {
    pub fn cpu() -> Self {
        Self { device: Device::Cpu }
    }

    pub fn with_device(device: Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Evaluate `graph`, resolving placeholders against `feeds`, and return
    /// the values of `fetches` in order.
    pub fn run(
        &self,
        graph: &Graph,
        feeds: &[(NodeId, Tensor)],
        fetches: &[NodeId],
    ) -> Result<Vec<Tensor>, GraphError> {
        tracing::trace!(
            nodes = graph.len(),
            feeds = feeds.len(),
            fetches = fetches.len(),
            "running graph"
        );
        for (id, _) in feeds {
            match graph.node(*id) {
                None => return Err(GraphError::UnknownNode(*id)),
                Some(Node::Placeholder { .. }) => {}
                Some(_) => return Err(GraphError::FeedTargetNotPlaceholder(*id)),
            }
        }
        // Op inputs must reference earlier nodes; ids forged with
        // `NodeId::from_index` get a typed rejection instead of a bad index.
        for (index, node) in graph.nodes().iter().enumerate() {
            if let Node::Op(op) = node {
                for input in op.inputs() {
                    if input.0 >= index {
                        return Err(GraphError::UnknownNode(input));
                    }
                }
            }
        }

        let mut values: Vec<Tensor> = Vec::with_capacity(graph.len());
        for (index, node) in graph.nodes().iter().enumerate() {
            let id = NodeId(index);
            let value = match node {
                Node::Placeholder { dtype, shape } => {
                    let fed = feeds
                        .iter()
                        .find(|(fid, _)| *fid == id)
                        .map(|(_, t)| t)
                        .ok_or(GraphError::MissingFeed(id))?;
                    if fed.dtype() != *dtype {
                        return Err(GraphError::FeedDTypeMismatch {
                            node: id,
                            fed: fed.dtype(),
                            declared: *dtype,
                        });
                    }
                    if fed.dims() != shape.as_slice() {
                        return Err(GraphError::FeedShapeMismatch {
                            node: id,
                            fed: fed.dims().to_vec(),
                            declared: shape.clone(),
                        });
                    }
                    fed.clone()
                }
                Node::Constant(t) => t.clone(),
                Node::Op(op) => eval_op(op, &values)?,
            };
            values.push(value);
        }

        let mut out = Vec::with_capacity(fetches.len());
        for id in fetches {
            let value = values.get(id.0).ok_or(GraphError::UnknownNode(*id))?;
            out.push(value.clone());
        }
        Ok(out)
    }
}

fn eval_op(op: &OpNode, values: &[Tensor]) -> Result<Tensor, GraphError> {
    // Input ids precede this node by construction.
    let val = |id: NodeId| &values[id.0];
    let out = match op {
        OpNode::Binary { kind, lhs, rhs, broadcast } => {
            let (a, b) = (val(*lhs), val(*rhs));
            if *broadcast {
                match kind {
                    BinaryKind::Add => a.broadcast_add(b)?,
                    BinaryKind::Sub => a.broadcast_sub(b)?,
                    BinaryKind::Mul => a.broadcast_mul(b)?,
                    BinaryKind::Div => a.broadcast_div(b)?,
                    BinaryKind::Maximum => a.broadcast_maximum(b)?,
                    BinaryKind::Minimum => a.broadcast_minimum(b)?,
                }
            } else {
                match kind {
                    BinaryKind::Add => a.add(b)?,
                    BinaryKind::Sub => a.sub(b)?,
                    BinaryKind::Mul => a.mul(b)?,
                    BinaryKind::Div => a.div(b)?,
                    BinaryKind::Maximum => a.maximum(b)?,
                    BinaryKind::Minimum => a.minimum(b)?,
                }
            }
        }
        OpNode::Unary { kind, input } => {
            let x = val(*input);
            match kind {
                UnaryKind::Neg => x.neg()?,
                UnaryKind::Abs => x.abs()?,
                UnaryKind::Exp => x.exp()?,
                UnaryKind::Log => x.log()?,
                UnaryKind::Sqrt => x.sqrt()?,
                UnaryKind::Sqr => x.sqr()?,
                UnaryKind::Sin => x.sin()?,
                UnaryKind::Cos => x.cos()?,
                UnaryKind::Tanh => x.tanh()?,
                UnaryKind::Relu => x.relu()?,
            }
        }
        OpNode::MatMul { lhs, rhs } => val(*lhs).matmul(val(*rhs))?,
        OpNode::Conv2d { input, kernel, padding, stride, dilation, groups } => {
            let x = val(*input);
            let k = val(*kernel);
            let (_, _, h, w) = x.dims4()?;
            let (_, _, kh, kw) = k.dims4()?;
            let fits = |extent: usize, ksz: usize| {
                *stride >= 1
                    && *dilation >= 1
                    && *groups >= 1
                    && ksz >= 1
                    && extent + 2 * padding >= dilation * (ksz - 1) + 1
            };
            if !fits(h, kh) || !fits(w, kw) {
                return Err(GraphError::ConvContract {
                    input: x.dims().to_vec(),
                    kernel: k.dims().to_vec(),
                    padding: *padding,
                    stride: *stride,
                    dilation: *dilation,
                });
            }
            x.conv2d(k, *padding, *stride, *dilation, *groups)?
        }
        OpNode::AvgPool2d { input, kernel, stride } => {
            let x = val(*input);
            pool_guard(x, *kernel, *stride)?;
            x.avg_pool2d_with_stride(*kernel, *stride)?
        }
        OpNode::MaxPool2d { input, kernel, stride } => {
            let x = val(*input);
            pool_guard(x, *kernel, *stride)?;
            x.max_pool2d_with_stride(*kernel, *stride)?
        }
        OpNode::BatchNorm { input, mean, variance, scale, offset, epsilon } => {
            let centered = val(*input).broadcast_sub(val(*mean))?;
            let denom = val(*variance).affine(1.0, *epsilon)?.sqrt()?;
            let normed = centered.broadcast_div(&denom)?;
            normed.broadcast_mul(val(*scale))?.broadcast_add(val(*offset))?
        }
        OpNode::Softmax { input, dim } => candle_nn::ops::softmax(val(*input), *dim)?,
        OpNode::Reduce { kind, input, dims, keep_dims } => {
            let x = val(*input);
            match kind {
                ReduceKind::Sum => {
                    if *keep_dims {
                        x.sum_keepdim(dims.clone())?
                    } else {
                        x.sum(dims.clone())?
                    }
                }
                ReduceKind::Mean => {
                    if *keep_dims {
                        x.mean_keepdim(dims.clone())?
                    } else {
                        x.mean(dims.clone())?
                    }
                }
                ReduceKind::Max | ReduceKind::Min => {
                    let mut sorted = dims.clone();
                    sorted.sort_unstable();
                    sorted.dedup();
                    let mut acc = x.clone();
                    for &d in &sorted {
                        acc = match kind {
                            ReduceKind::Max => acc.max_keepdim(d)?,
                            _ => acc.min_keepdim(d)?,
                        };
                    }
                    if !*keep_dims {
                        for &d in sorted.iter().rev() {
                            acc = acc.squeeze(d)?;
                        }
                    }
                    acc
                }
            }
        }
        OpNode::Concat { inputs, axis } => {
            let ts: Vec<Tensor> = inputs.iter().map(|id| val(*id).clone()).collect();
            Tensor::cat(&ts, *axis)?
        }
        OpNode::Narrow { input, dim, start, len } => val(*input).narrow(*dim, *start, *len)?,
        OpNode::Transpose { input, dim1, dim2 } => val(*input).transpose(*dim1, *dim2)?,
        OpNode::Reshape { input, shape } => val(*input).reshape(shape.clone())?,
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
            use_nesterov,
        } => {
            let (b1, b2) = (val(*beta1), val(*beta2));
            let g = val(*grad);
            let one_minus_b1 = b1.affine(-1.0, 1.0)?;
            let one_minus_b2 = b2.affine(-1.0, 1.0)?;
            let m_next = val(*m)
                .broadcast_mul(b1)?
                .broadcast_add(&g.broadcast_mul(&one_minus_b1)?)?;
            let v_next = val(*v)
                .broadcast_mul(b2)?
                .broadcast_add(&g.sqr()?.broadcast_mul(&one_minus_b2)?)?;
            let alpha = val(*lr)
                .broadcast_mul(&val(*beta2_power).affine(-1.0, 1.0)?.sqrt()?)?
                .broadcast_div(&val(*beta1_power).affine(-1.0, 1.0)?)?;
            let m_hat = if *use_nesterov {
                m_next.broadcast_mul(b1)?.broadcast_add(&g.broadcast_mul(&one_minus_b1)?)?
            } else {
                m_next
            };
            let denom = v_next.sqrt()?.broadcast_add(val(*epsilon))?;
            val(*var).broadcast_sub(&m_hat.broadcast_mul(&alpha)?.broadcast_div(&denom)?)?
        }
    };
    Ok(out)
}

/// Pooling in the backend assumes the kernel fits; reject the rest here so
/// an oversized kernel surfaces as a typed error instead of an underflow.
fn pool_guard(
    x: &Tensor,
    kernel: (usize, usize),
    stride: (usize, usize),
) -> Result<(), GraphError> {
    let (_, _, h, w) = x.dims4()?;
    let (kh, kw) = kernel;
    let (sh, sw) = stride;
    if kh == 0 || kw == 0 || sh == 0 || sw == 0 || kh > h || kw > w {
        return Err(GraphError::PoolContract {
            kernel,
            stride,
            input: x.dims().to_vec(),
        });
    }
    Ok(())
}
