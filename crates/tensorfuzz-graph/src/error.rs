// SPDX-License-Identifier: MIT OR Apache-2.0

use candle_core::DType;
use thiserror::Error;

use crate::graph::NodeId;

/// Everything `Session::run` can report. `Compute` wraps the tensor
/// library's own validation failures; the rest are graph-level contract
/// violations detected before any kernel runs.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("placeholder {0:?} was not fed")]
    MissingFeed(NodeId),

    #[error("node {0:?} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("feed target {0:?} is not a placeholder")]
    FeedTargetNotPlaceholder(NodeId),

    #[error("feed for {node:?}: dtype {fed:?} does not match declared {declared:?}")]
    FeedDTypeMismatch { node: NodeId, fed: DType, declared: DType },

    #[error("feed for {node:?}: shape {fed:?} does not match declared {declared:?}")]
    FeedShapeMismatch { node: NodeId, fed: Vec<usize>, declared: Vec<usize> },

    #[error("pool kernel {kernel:?} / stride {stride:?} does not fit input {input:?}")]
    PoolContract { kernel: (usize, usize), stride: (usize, usize), input: Vec<usize> },

    #[error(
        "conv geometry does not fit: input {input:?}, kernel {kernel:?}, \
         padding {padding}, stride {stride}, dilation {dilation}"
    )]
    ConvContract {
        input: Vec<usize>,
        kernel: Vec<usize>,
        padding: usize,
        stride: usize,
        dilation: usize,
    },

    #[error(transparent)]
    Compute(#[from] candle_core::Error),
}
