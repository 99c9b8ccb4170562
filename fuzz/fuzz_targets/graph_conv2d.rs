#![no_main]

use libfuzzer_sys::fuzz_target;
use tensorfuzz_harness::ops::conv2d;
use tensorfuzz_harness::Outcome;

fuzz_target!(|data: &[u8]| {
    tensorfuzz_fuzz::init();
    if let Outcome::Anomaly(report) = conv2d::run(data) {
        panic!("{report}");
    }
});
