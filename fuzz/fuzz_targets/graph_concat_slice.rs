#![no_main]

use libfuzzer_sys::fuzz_target;
use tensorfuzz_harness::ops::concat_slice;
use tensorfuzz_harness::Outcome;

fuzz_target!(|data: &[u8]| {
    tensorfuzz_fuzz::init();
    if let Outcome::Anomaly(report) = concat_slice::run(data) {
        panic!("{report}");
    }
});
