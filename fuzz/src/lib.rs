//! Shared setup for the fuzz binaries.

use std::sync::Once;

/// Install the tracing subscriber once per process. Anomaly logs go to
/// stderr so they sit next to libFuzzer's own crash output.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    });
}
