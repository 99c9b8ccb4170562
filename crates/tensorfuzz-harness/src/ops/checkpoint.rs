// SPDX-License-Identifier: MIT OR Apache-2.0
//! Checkpoint bundle round trip: safetensors file plus a JSON manifest,
//! written under an injected scratch directory.

use std::collections::HashMap;
use std::path::Path;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use tensorfuzz_input::{InputCursor, Limits, TensorDescriptor};

use crate::classify::{self, ErrorClass};
use crate::outcome::Outcome;

pub const OP: &str = "io.checkpoint_bundle";
pub const MIN_INPUT_LEN: usize = 8;

const EXPECTED: &[ErrorClass] =
    &[ErrorClass::Io, ErrorClass::UnsupportedDType, ErrorClass::Other];

/// Per-tensor manifest record, serialized next to the weights.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct ManifestEntry {
    dtype: String,
    shape: Vec<usize>,
}

/// Entry point used by the fuzz target: every invocation gets a fresh
/// scratch directory, so parallel drivers never collide.
pub fn run(data: &[u8]) -> Outcome {
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => return Outcome::anomaly(OP, format!("scratch dir creation failed: {e}")),
    };
    run_in_dir(data, dir.path())
}

/// The actual harness, with the bundle location injected.
pub fn run_in_dir(data: &[u8], dir: &Path) -> Outcome {
    if data.len() < MIN_INPUT_LEN {
        return Outcome::Accepted;
    }
    let limits = Limits::from_env();
    let mut cur = InputCursor::new(data);

    let count = cur.read_bounded_usize(1, 3);
    let device = super::device();

    let mut tensors: HashMap<String, Tensor> = HashMap::new();
    let mut manifest: HashMap<String, ManifestEntry> = HashMap::new();
    for i in 0..count {
        let desc = TensorDescriptor::decode(&mut cur, &limits);
        let t = match desc.to_tensor(&device) {
            Ok(t) => t,
            Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
        };
        let name = format!("tensor_{i}");
        manifest.insert(
            name.clone(),
            ManifestEntry { dtype: format!("{:?}", t.dtype()), shape: desc.shape.clone() },
        );
        tensors.insert(name, t);
    }

    let weights_path = dir.join("weights.safetensors");
    let manifest_path = dir.join("manifest.json");

    if let Err(e) = candle_core::safetensors::save(&tensors, &weights_path) {
        return classify::candle_outcome(OP, EXPECTED, &e);
    }
    let manifest_json = match serde_json::to_vec_pretty(&manifest) {
        Ok(j) => j,
        Err(e) => return Outcome::anomaly(OP, format!("manifest serialization failed: {e}")),
    };
    if let Err(e) = std::fs::write(&manifest_path, manifest_json) {
        tracing::debug!(op = OP, error = %e, "manifest write rejected");
        return Outcome::Accepted;
    }

    // Read the bundle back and hold it against what was written.
    let loaded = match candle_core::safetensors::load(&weights_path, &device) {
        Ok(l) => l,
        Err(e) => return classify::candle_outcome(OP, EXPECTED, &e),
    };
    let manifest_back: HashMap<String, ManifestEntry> = match std::fs::read(&manifest_path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
    {
        Ok(m) => m,
        Err(e) => return Outcome::anomaly(OP, format!("manifest read back failed: {e}")),
    };

    if manifest_back != manifest {
        return Outcome::anomaly(OP, "manifest changed across the round trip");
    }
    if loaded.len() != tensors.len() {
        return Outcome::anomaly(
            OP,
            format!("wrote {} tensors, loaded {}", tensors.len(), loaded.len()),
        );
    }
    for (name, original) in &tensors {
        let Some(restored) = loaded.get(name) else {
            return Outcome::anomaly(OP, format!("tensor {name} missing after reload"));
        };
        if restored.dims() != original.dims() || restored.dtype() != original.dtype() {
            return Outcome::anomaly(
                OP,
                format!(
                    "tensor {name} came back as {:?}/{:?}, wrote {:?}/{:?}",
                    restored.dims(),
                    restored.dtype(),
                    original.dims(),
                    original.dtype()
                ),
            );
        }
    }
    Outcome::Accepted
}
