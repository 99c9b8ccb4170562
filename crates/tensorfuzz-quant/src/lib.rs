// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block quantization over candle tensors
//!
//! Two schemes, both one code byte per element:
//! - `SymmetricI8`: per-block absmax scale, codes in `[-127, 127]`.
//! - `AffineU8`: per-block min/max range widened to include zero, codes in
//!   `[0, 255]` with an explicit zero point.
//!
//! The range-includes-zero rule pins constant blocks to an extreme code, so
//! a block of one repeated value reconstructs to within float rounding of
//! that value, and an all-zero block reconstructs exactly.
//! Tensors containing non-finite values are rejected up front; quantizing
//! NaN is not meaningful for either scheme.

use candle_core::{DType, Device, Tensor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuantError {
    #[error("cannot quantize an empty tensor")]
    EmptyTensor,

    #[error("block size must be non-zero")]
    ZeroBlockSize,

    #[error("tensor contains non-finite values")]
    NonFiniteInput,

    #[error("quantized data holds {got} codes but shape {shape:?} needs {expected}")]
    LengthMismatch { expected: usize, got: usize, shape: Vec<usize> },

    #[error("expected {expected} block scales, got {got}")]
    ScaleCountMismatch { expected: usize, got: usize },

    #[error("affine data is missing its zero points")]
    MissingZeroPoints,

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantScheme {
    SymmetricI8,
    AffineU8,
}

/// Quantized representation: one code byte per element plus per-block
/// parameters.
#[derive(Debug, Clone)]
pub struct QuantizedTensor {
    /// Element codes, row-major. Symmetric codes are `i8` stored as `u8`.
    pub data: Vec<u8>,
    /// One scale per block.
    pub scales: Vec<f32>,
    /// One zero point per block; `None` for symmetric data.
    pub zero_points: Option<Vec<i32>>,
    /// Original tensor shape.
    pub shape: Vec<usize>,
    pub scheme: QuantScheme,
    /// Elements per block; the final block may be shorter.
    pub block_size: usize,
}

impl QuantizedTensor {
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn num_blocks(&self) -> usize {
        self.elem_count().div_ceil(self.block_size.max(1))
    }

    /// Largest representable absolute reconstruction error, half a
    /// quantization step of the widest block.
    pub fn max_step(&self) -> f32 {
        self.scales.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Reconstruct a float tensor on `device`.
    pub fn dequantize(&self, device: &Device) -> Result<Tensor, QuantError> {
        let expected = self.elem_count();
        if self.data.len() != expected {
            return Err(QuantError::LengthMismatch {
                expected,
                got: self.data.len(),
                shape: self.shape.clone(),
            });
        }
        if self.block_size == 0 {
            return Err(QuantError::ZeroBlockSize);
        }
        let blocks = self.num_blocks();
        if self.scales.len() != blocks {
            return Err(QuantError::ScaleCountMismatch { expected: blocks, got: self.scales.len() });
        }

        let mut out = Vec::with_capacity(expected);
        match self.scheme {
            QuantScheme::SymmetricI8 => {
                for (i, &code) in self.data.iter().enumerate() {
                    let scale = self.scales[i / self.block_size];
                    out.push(code as i8 as f32 * scale);
                }
            }
            QuantScheme::AffineU8 => {
                let zero_points =
                    self.zero_points.as_ref().ok_or(QuantError::MissingZeroPoints)?;
                if zero_points.len() != blocks {
                    return Err(QuantError::ScaleCountMismatch {
                        expected: blocks,
                        got: zero_points.len(),
                    });
                }
                for (i, &code) in self.data.iter().enumerate() {
                    let block = i / self.block_size;
                    let scale = self.scales[block];
                    let zp = zero_points[block];
                    out.push((code as i32 - zp) as f32 * scale);
                }
            }
        }
        Ok(Tensor::from_vec(out, self.shape.clone(), device)?)
    }
}

/// Quantize `tensor` blockwise. The tensor is flattened row-major; any
/// float dtype is accepted and converted through `f32`.
pub fn quantize(
    tensor: &Tensor,
    scheme: QuantScheme,
    block_size: usize,
) -> Result<QuantizedTensor, QuantError> {
    if block_size == 0 {
        return Err(QuantError::ZeroBlockSize);
    }
    if tensor.elem_count() == 0 {
        return Err(QuantError::EmptyTensor);
    }
    let values: Vec<f32> =
        tensor.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(QuantError::NonFiniteInput);
    }

    let mut data = Vec::with_capacity(values.len());
    let mut scales = Vec::new();
    let mut zero_points = Vec::new();

    for block in values.chunks(block_size) {
        match scheme {
            QuantScheme::SymmetricI8 => {
                let absmax = block.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
                let scale = absmax / 127.0;
                scales.push(scale);
                for &v in block {
                    let code = if scale == 0.0 {
                        0i8
                    } else {
                        (v / scale).round().clamp(-127.0, 127.0) as i8
                    };
                    data.push(code as u8);
                }
            }
            QuantScheme::AffineU8 => {
                // Widen the range to include zero so constants stay exact.
                let lo = block.iter().fold(0.0f32, |acc, v| acc.min(*v));
                let hi = block.iter().fold(0.0f32, |acc, v| acc.max(*v));
                // Range arithmetic in f64: hi - lo can overflow f32 when the
                // block spans both float extremes.
                let scale = ((hi as f64 - lo as f64) / 255.0) as f32;
                let zp = if scale == 0.0 {
                    0i32
                } else {
                    (-lo / scale).round().clamp(0.0, 255.0) as i32
                };
                scales.push(scale);
                zero_points.push(zp);
                for &v in block {
                    let code = if scale == 0.0 {
                        0i32
                    } else {
                        ((v / scale).round() as i32 + zp).clamp(0, 255)
                    };
                    data.push(code as u8);
                }
            }
        }
    }

    Ok(QuantizedTensor {
        data,
        scales,
        zero_points: match scheme {
            QuantScheme::SymmetricI8 => None,
            QuantScheme::AffineU8 => Some(zero_points),
        },
        shape: tensor.dims().to_vec(),
        scheme,
        block_size,
    })
}

/// Quantize then immediately reconstruct; the common fuzz round trip.
pub fn round_trip(
    tensor: &Tensor,
    scheme: QuantScheme,
    block_size: usize,
) -> Result<Tensor, QuantError> {
    quantize(tensor, scheme, block_size)?.dequantize(tensor.device())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor_of(data: Vec<f32>) -> Tensor {
        let len = data.len();
        Tensor::from_vec(data, len, &Device::Cpu).unwrap()
    }

    #[test]
    fn symmetric_round_trip_error_is_within_one_step() {
        let t = tensor_of(vec![1.0, -2.0, 0.5, -0.5, 3.0, -1.5, 0.0, 2.5]);
        let q = quantize(&t, QuantScheme::SymmetricI8, 4).unwrap();
        let back = q.dequantize(&Device::Cpu).unwrap().to_vec1::<f32>().unwrap();
        let orig = t.to_vec1::<f32>().unwrap();
        for (a, b) in orig.iter().zip(&back) {
            assert!((a - b).abs() <= q.max_step(), "{a} vs {b}");
        }
    }

    #[test]
    fn affine_round_trip_error_is_within_one_step() {
        let t = tensor_of(vec![0.1, 0.9, 0.4, 0.7, -0.3, -0.8]);
        let q = quantize(&t, QuantScheme::AffineU8, 3).unwrap();
        let back = q.dequantize(&Device::Cpu).unwrap().to_vec1::<f32>().unwrap();
        let orig = t.to_vec1::<f32>().unwrap();
        for (a, b) in orig.iter().zip(&back) {
            assert!((a - b).abs() <= q.max_step(), "{a} vs {b}");
        }
    }

    #[test]
    fn all_zero_block_round_trips_exactly() {
        let t = tensor_of(vec![0.0; 16]);
        for scheme in [QuantScheme::SymmetricI8, QuantScheme::AffineU8] {
            let back = round_trip(&t, scheme, 8).unwrap().to_vec1::<f32>().unwrap();
            assert_eq!(back, vec![0.0; 16]);
        }
    }

    #[test]
    fn constant_block_round_trips_to_float_rounding() {
        for value in [3.5f32, -2.25, 100.0] {
            let t = tensor_of(vec![value; 8]);
            for scheme in [QuantScheme::SymmetricI8, QuantScheme::AffineU8] {
                let back = round_trip(&t, scheme, 8).unwrap().to_vec1::<f32>().unwrap();
                for b in back {
                    let rel = (b - value).abs() / value.abs();
                    assert!(rel <= 1e-5, "scheme {scheme:?}: {b} vs {value}");
                }
            }
        }
    }

    #[test]
    fn contract_violations_are_typed() {
        let t = tensor_of(vec![1.0, 2.0]);
        assert!(matches!(
            quantize(&t, QuantScheme::SymmetricI8, 0),
            Err(QuantError::ZeroBlockSize)
        ));

        let nan = tensor_of(vec![f32::NAN, 1.0]);
        assert!(matches!(
            quantize(&nan, QuantScheme::AffineU8, 2),
            Err(QuantError::NonFiniteInput)
        ));

        let mut q = quantize(&t, QuantScheme::SymmetricI8, 2).unwrap();
        q.data.pop();
        assert!(matches!(
            q.dequantize(&Device::Cpu),
            Err(QuantError::LengthMismatch { .. })
        ));

        let mut q = quantize(&t, QuantScheme::AffineU8, 2).unwrap();
        q.zero_points = None;
        assert!(matches!(q.dequantize(&Device::Cpu), Err(QuantError::MissingZeroPoints)));
    }

    #[test]
    fn scale_count_is_validated() {
        let t = tensor_of(vec![1.0; 10]);
        let mut q = quantize(&t, QuantScheme::SymmetricI8, 4).unwrap();
        assert_eq!(q.num_blocks(), 3);
        q.scales.pop();
        assert!(matches!(
            q.dequantize(&Device::Cpu),
            Err(QuantError::ScaleCountMismatch { .. })
        ));
    }
}
