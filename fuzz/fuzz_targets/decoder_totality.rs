#![no_main]

use libfuzzer_sys::fuzz_target;
use tensorfuzz_input::{InputCursor, Limits, TensorDescriptor};

// The decoder's contract is totality: any byte buffer yields a structurally
// valid descriptor, in bounds, without reading past the input. A tensor
// built from such a descriptor can never be rejected.
fuzz_target!(|data: &[u8]| {
    tensorfuzz_fuzz::init();
    let limits = Limits::default();
    let mut cur = InputCursor::new(data);

    for _ in 0..3 {
        let desc = TensorDescriptor::decode(&mut cur, &limits);
        assert!(desc.rank() <= limits.max_rank);
        for dim in &desc.shape {
            assert!((limits.min_dim..=limits.max_dim).contains(dim));
        }
        assert!(desc.elem_count() <= limits.max_elems);
        assert_eq!(desc.data.len(), desc.elem_count() * desc.dtype.size_in_bytes());
        assert!(cur.offset() <= data.len());

        let tensor = desc
            .to_tensor(&candle_core::Device::Cpu)
            .expect("well-formed descriptors always materialize");
        assert_eq!(tensor.dims(), desc.shape.as_slice());
    }

    // Drained or not, further reads must keep yielding defaults in range.
    let v = cur.read_bounded_i64(-3, 3);
    assert!((-3..=3).contains(&v));
});
