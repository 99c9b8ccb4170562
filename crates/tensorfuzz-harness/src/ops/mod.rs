// SPDX-License-Identifier: MIT OR Apache-2.0
//! One module per fuzzed operation.
//!
//! Every module exposes the same surface: an `OP` name, a `MIN_INPUT_LEN`
//! guard, and `run(data) -> Outcome`. Bodies stay self-contained on
//! purpose — each harness decodes exactly the fields its operation needs,
//! in input order, so a corpus file maps onto the call by inspection.

pub mod adam;
pub mod batch_norm;
pub mod binary_ops;
pub mod chained;
pub mod checkpoint;
pub mod concat_slice;
pub mod conv2d;
pub mod decompose;
pub mod index_select;
pub mod layer_norm;
pub mod linear_module;
pub mod matmul;
pub mod pooling;
pub mod quant_blocks;
pub mod quant_ggml;
pub mod reduction;
pub mod softmax;
pub mod transpose_reshape;
pub mod unary_ops;

use candle_core::Device;

/// All harnesses run on the CPU backend; the external driver owns
/// process-level parallelism.
pub(crate) fn device() -> Device {
    Device::Cpu
}
