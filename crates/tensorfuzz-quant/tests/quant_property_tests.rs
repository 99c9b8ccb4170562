//! Property-based round-trip bounds for both quantization schemes.

use candle_core::{Device, Tensor};
use proptest::prelude::*;
use tensorfuzz_quant::{quantize, QuantScheme, QuantizedTensor};

fn finite_f32() -> impl Strategy<Value = f32> {
    // Keep magnitudes in a range where a 1-byte code is meaningful.
    (-1e4f32..1e4).prop_map(|v| if v.is_finite() { v } else { 0.0 })
}

fn check_round_trip(values: Vec<f32>, scheme: QuantScheme, block_size: usize) {
    let len = values.len();
    let t = Tensor::from_vec(values.clone(), len, &Device::Cpu).unwrap();
    let q: QuantizedTensor = quantize(&t, scheme, block_size).unwrap();

    assert_eq!(q.data.len(), len);
    assert_eq!(q.scales.len(), q.num_blocks());

    let back = q.dequantize(&Device::Cpu).unwrap().to_vec1::<f32>().unwrap();
    assert_eq!(back.len(), len);
    // Per-element error stays within one quantization step, with a little
    // slack for float rounding in scale computation.
    let bound = q.max_step() * 1.01 + 1e-6;
    for (a, b) in values.iter().zip(&back) {
        assert!((a - b).abs() <= bound, "|{a} - {b}| > {bound}");
    }
}

proptest! {
    #[test]
    fn symmetric_round_trip_is_bounded(
        values in proptest::collection::vec(finite_f32(), 1..128),
        block in 1usize..32,
    ) {
        check_round_trip(values, QuantScheme::SymmetricI8, block);
    }

    #[test]
    fn affine_round_trip_is_bounded(
        values in proptest::collection::vec(finite_f32(), 1..128),
        block in 1usize..32,
    ) {
        check_round_trip(values, QuantScheme::AffineU8, block);
    }

    /// Quantization is deterministic: same input, same codes.
    #[test]
    fn quantization_is_deterministic(
        values in proptest::collection::vec(finite_f32(), 1..64),
        block in 1usize..16,
    ) {
        let len = values.len();
        let t = Tensor::from_vec(values, len, &Device::Cpu).unwrap();
        let a = quantize(&t, QuantScheme::AffineU8, block).unwrap();
        let b = quantize(&t, QuantScheme::AffineU8, block).unwrap();
        prop_assert_eq!(a.data, b.data);
        prop_assert_eq!(a.scales, b.scales);
        prop_assert_eq!(a.zero_points, b.zero_points);
    }
}
