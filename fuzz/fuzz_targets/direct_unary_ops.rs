#![no_main]

use libfuzzer_sys::fuzz_target;
use tensorfuzz_harness::ops::unary_ops;
use tensorfuzz_harness::Outcome;

fuzz_target!(|data: &[u8]| {
    tensorfuzz_fuzz::init();
    if let Outcome::Anomaly(report) = unary_ops::run(data) {
        panic!("{report}");
    }
});
