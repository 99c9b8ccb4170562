// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoded tensor descriptors: dtype + shape + raw element bytes.

use candle_core::{Device, Result as CandleResult, Tensor};
use half::{bf16, f16};

use crate::cursor::InputCursor;
use crate::dtype::ElementType;
use crate::limits::Limits;

/// A structurally valid tensor decoded from fuzz input.
///
/// `data` always holds exactly `elem_count() * dtype.size_in_bytes()` bytes.
/// Element bytes are copied verbatim from the input, so float buffers may
/// contain NaN, infinities or subnormals. That is the point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    pub dtype: ElementType,
    pub shape: Vec<usize>,
    pub data: Vec<u8>,
}

impl TensorDescriptor {
    /// Decode dtype, rank, shape and buffer off the cursor.
    pub fn decode(cur: &mut InputCursor<'_>, limits: &Limits) -> Self {
        let dtype = ElementType::from_selector(cur.read_u8());
        Self::decode_with_dtype(cur, limits, dtype)
    }

    /// Decode rank, shape and buffer; the caller fixes the dtype (for
    /// operations that only take floats, say).
    pub fn decode_with_dtype(
        cur: &mut InputCursor<'_>,
        limits: &Limits,
        dtype: ElementType,
    ) -> Self {
        let rank = cur.read_bounded_u8(0, limits.max_rank as u8) as usize;
        let shape = decode_shape(cur, limits, rank);
        Self::from_shape(cur, dtype, shape)
    }

    /// Fill a buffer for an already-known dtype and shape.
    pub fn from_shape(cur: &mut InputCursor<'_>, dtype: ElementType, shape: Vec<usize>) -> Self {
        let elem_count: usize = shape.iter().product();
        let data = cur.fill_bytes(elem_count, dtype.size_in_bytes());
        Self { dtype, shape, data }
    }

    /// A rank-0 descriptor (single element), the shape every scalar
    /// operand uses.
    pub fn scalar(cur: &mut InputCursor<'_>, dtype: ElementType) -> Self {
        Self::from_shape(cur, dtype, Vec::new())
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Materialize as a `candle_core::Tensor` on `device`.
    pub fn to_tensor(&self, device: &Device) -> CandleResult<Tensor> {
        let shape = self.shape.clone();
        match self.dtype {
            ElementType::F32 => Tensor::from_vec(self.elements::<f32>(), shape, device),
            ElementType::F64 => Tensor::from_vec(self.elements::<f64>(), shape, device),
            ElementType::F16 => Tensor::from_vec(self.elements::<f16>(), shape, device),
            ElementType::BF16 => Tensor::from_vec(self.elements::<bf16>(), shape, device),
            ElementType::U8 => Tensor::from_vec(self.elements::<u8>(), shape, device),
            ElementType::U32 => Tensor::from_vec(self.elements::<u32>(), shape, device),
            ElementType::I64 => Tensor::from_vec(self.elements::<i64>(), shape, device),
        }
    }

    /// Reinterpret the raw buffer as typed elements.
    pub fn elements<T: bytemuck::Pod>(&self) -> Vec<T> {
        self.data
            .chunks_exact(core::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

/// Decode `rank` extents, each independently folded into
/// `[limits.min_dim, limits.max_dim]`; exhausted input defaults to 1.
///
/// Extents are then capped left to right so the running element count never
/// exceeds `limits.max_elems` (an overflowing dimension collapses to 1).
pub fn decode_shape(cur: &mut InputCursor<'_>, limits: &Limits, rank: usize) -> Vec<usize> {
    let mut shape = Vec::with_capacity(rank);
    for _ in 0..rank {
        let dim = if cur.remaining() >= core::mem::size_of::<i64>() {
            cur.read_bounded_usize(limits.min_dim, limits.max_dim)
        } else {
            1
        };
        shape.push(dim);
    }
    let mut running = 1usize;
    for dim in shape.iter_mut() {
        match running.checked_mul(*dim) {
            Some(total) if total <= limits.max_elems => running = total,
            _ => *dim = 1,
        }
    }
    shape
}
