//! Property-based tests for the fuzz input decoder.
//!
//! The decoder's whole contract is that it is total: any byte buffer, of any
//! length, decodes to a structurally valid descriptor, deterministically.

use proptest::prelude::*;
use tensorfuzz_input::{descriptor, ElementType, InputCursor, Limits, TensorDescriptor};

proptest! {
    /// Decoding terminates and yields an in-bounds descriptor for any input.
    #[test]
    fn decoding_is_total(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let limits = Limits::default();
        let mut cur = InputCursor::new(&data);
        let desc = TensorDescriptor::decode(&mut cur, &limits);

        prop_assert!(desc.rank() <= limits.max_rank);
        for dim in &desc.shape {
            prop_assert!((limits.min_dim..=limits.max_dim).contains(dim));
        }
        prop_assert!(desc.elem_count() <= limits.max_elems);
        prop_assert_eq!(desc.data.len(), desc.elem_count() * desc.dtype.size_in_bytes());
        prop_assert!(cur.offset() <= data.len());
    }

    /// Identical bytes decode to identical descriptors and buffers.
    #[test]
    fn decoding_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let limits = Limits::default();
        let mut a = InputCursor::new(&data);
        let mut b = InputCursor::new(&data);
        let first = TensorDescriptor::decode(&mut a, &limits);
        let second = TensorDescriptor::decode(&mut b, &limits);
        prop_assert_eq!(first, second);
        prop_assert_eq!(a.offset(), b.offset());
    }

    /// Once the cursor hits the end, every read yields the zero default.
    #[test]
    fn exhausted_reads_yield_defaults(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut cur = InputCursor::new(&data);
        // Drain the buffer byte by byte.
        while !cur.is_exhausted() {
            let _ = cur.read_u8();
        }
        prop_assert_eq!(cur.read_scalar::<u64>(), 0);
        prop_assert_eq!(cur.read_u8(), 0);
        prop_assert!(!cur.read_bool());
        prop_assert_eq!(cur.read_bounded_u8(2, 9), 2);
        prop_assert_eq!(cur.read_bounded_i64(-4, 11), -4);
        prop_assert_eq!(cur.read_selector(17), 0);
        prop_assert_eq!(cur.offset(), data.len());
    }

    /// Bounded reads land in range for arbitrary bounds and raw bytes.
    #[test]
    fn bounded_reads_are_bounded(
        data in proptest::collection::vec(any::<u8>(), 0..64),
        lo in -1000i64..1000,
        span in 0i64..500,
    ) {
        let hi = lo + span;
        let mut cur = InputCursor::new(&data);
        for _ in 0..8 {
            let v = cur.read_bounded_i64(lo, hi);
            prop_assert!((lo..=hi).contains(&v));
        }
    }

    /// Selector values always index into the dtype table.
    #[test]
    fn dtype_selector_is_in_range(raw in any::<u8>()) {
        let et = ElementType::from_selector(raw);
        prop_assert!(ElementType::ALL.contains(&et));
    }

    /// Shape decoding respects the element cap even with generous bytes.
    #[test]
    fn shape_cap_holds(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        max_elems in 1usize..64,
    ) {
        let limits = Limits { max_elems, ..Limits::default() };
        let mut cur = InputCursor::new(&data);
        let shape = descriptor::decode_shape(&mut cur, &limits, limits.max_rank);
        let total: usize = shape.iter().product();
        prop_assert!(total <= max_elems.max(1));
    }
}
