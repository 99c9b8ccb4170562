//! Property tests: harnesses are total and deterministic over arbitrary
//! byte buffers. This is the same contract the fuzz targets assert, run
//! here over proptest's input distribution so CI exercises it without a
//! fuzzing engine.

use proptest::prelude::*;
use tensorfuzz_harness::ops::{
    binary_ops, concat_slice, decompose, matmul, quant_blocks, reduction, softmax,
    transpose_reshape, unary_ops,
};
use tensorfuzz_harness::Outcome;

fn sample_harnesses() -> Vec<(&'static str, fn(&[u8]) -> Outcome)> {
    vec![
        (matmul::OP, matmul::run),
        (reduction::OP, reduction::run),
        (concat_slice::OP, concat_slice::run),
        (transpose_reshape::OP, transpose_reshape::run),
        (binary_ops::OP, binary_ops::run),
        (unary_ops::OP, unary_ops::run),
        (softmax::OP, softmax::run),
        (quant_blocks::OP, quant_blocks::run),
        (decompose::OP, decompose::run),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn statuses_stay_in_contract(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
        for (op, run) in sample_harnesses() {
            let status = run(&data).status();
            prop_assert!(status == 0 || status == -1, "{op} returned {status}");
        }
    }

    #[test]
    fn outcomes_are_reproducible(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        for (op, run) in sample_harnesses() {
            prop_assert_eq!(run(&data).status(), run(&data).status(), "{}", op);
        }
    }
}
