//! Boundary scenarios for the decoder: empty input, all-zero input,
//! truncation between and inside fields.

use candle_core::Device;
use tensorfuzz_input::{ElementType, InputCursor, Limits, TensorDescriptor};

#[test]
fn all_zero_input_decodes_to_minimum_values() {
    let limits = Limits::default();
    let data = vec![0u8; 256];
    let mut cur = InputCursor::new(&data);
    let desc = TensorDescriptor::decode(&mut cur, &limits);

    // Selector 0 is the first dtype, raw-zero extents fold to min_dim.
    assert_eq!(desc.dtype, ElementType::F32);
    assert_eq!(desc.rank(), 0);
    assert!(desc.data.iter().all(|&b| b == 0));
    assert_eq!(desc.elements::<f32>(), vec![0.0]);
}

#[test]
fn all_zero_input_with_forced_rank_folds_dims_to_min() {
    let limits = Limits::default();
    let data = vec![0u8; 256];
    let mut cur = InputCursor::new(&data);
    let shape = tensorfuzz_input::descriptor::decode_shape(&mut cur, &limits, 3);
    assert_eq!(shape, vec![limits.min_dim; 3]);
}

#[test]
fn one_tensor_budget_zero_fills_the_second() {
    let limits = Limits::default();
    let mut data = Vec::new();
    data.push(0u8); // dtype -> F32
    data.push(2u8); // rank -> 2
    data.extend_from_slice(&1u64.to_le_bytes()); // dim -> 2
    data.extend_from_slice(&1u64.to_le_bytes()); // dim -> 2
    for i in 0..4 {
        data.extend_from_slice(&(i as f32).to_le_bytes());
    }
    // Budget ends exactly after the first tensor's buffer.
    let mut cur = InputCursor::new(&data);
    let first = TensorDescriptor::decode(&mut cur, &limits);
    assert_eq!(first.shape, vec![2, 2]);
    assert_eq!(first.elements::<f32>(), vec![0.0, 1.0, 2.0, 3.0]);
    assert!(cur.is_exhausted());

    let second = TensorDescriptor::decode_with_dtype(&mut cur, &limits, first.dtype);
    assert_eq!(second.rank(), 0);
    assert!(second.data.iter().all(|&b| b == 0));

    // A second tensor with the first one's shape is all zeros too.
    let mut cur = InputCursor::new(&data);
    let _ = TensorDescriptor::decode(&mut cur, &limits);
    let shadow = TensorDescriptor::from_shape(&mut cur, ElementType::F32, vec![2, 2]);
    assert_eq!(shadow.elements::<f32>(), vec![0.0; 4]);
}

#[test]
fn scalar_descriptor_consumes_one_element() {
    let data = 7.25f64.to_le_bytes();
    let mut cur = InputCursor::new(&data);
    let desc = TensorDescriptor::scalar(&mut cur, ElementType::F64);
    assert_eq!(desc.rank(), 0);
    assert_eq!(desc.elements::<f64>(), vec![7.25]);
    assert!(cur.is_exhausted());
}

#[test]
fn garbage_float_bytes_materialize_as_is() {
    // 0x7fc00000 is a quiet NaN; the decoder must pass it through untouched.
    let mut data = vec![0u8, 1u8];
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&f32::NAN.to_le_bytes());
    let limits = Limits::default();
    let mut cur = InputCursor::new(&data);
    let desc = TensorDescriptor::decode(&mut cur, &limits);
    assert_eq!(desc.shape, vec![1]);
    assert!(desc.elements::<f32>()[0].is_nan());

    let tensor = desc.to_tensor(&Device::Cpu).unwrap();
    assert!(tensor.to_vec1::<f32>().unwrap()[0].is_nan());
}
