// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decode bounds: rank, per-dimension extent, total element count.

use std::sync::OnceLock;

pub const DEFAULT_MAX_RANK: usize = 4;
pub const DEFAULT_MIN_DIM: usize = 1;
pub const DEFAULT_MAX_DIM: usize = 10;
pub const DEFAULT_MAX_ELEMS: usize = 1 << 16;

/// Bounds applied while decoding shapes.
///
/// Compiled defaults keep a single tensor under 64 Ki elements. Campaigns
/// that want a wider or narrower search space override them through the
/// environment (`TENSORFUZZ_MAX_RANK`, `TENSORFUZZ_MAX_DIM`,
/// `TENSORFUZZ_MAX_ELEMS`) instead of rebuilding the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_rank: usize,
    pub min_dim: usize,
    pub max_dim: usize,
    pub max_elems: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rank: DEFAULT_MAX_RANK,
            min_dim: DEFAULT_MIN_DIM,
            max_dim: DEFAULT_MAX_DIM,
            max_elems: DEFAULT_MAX_ELEMS,
        }
    }
}

impl Limits {
    /// Defaults merged with environment overrides, resolved once per
    /// process. Unparseable values keep the default and log a warning.
    pub fn from_env() -> Self {
        static RESOLVED: OnceLock<Limits> = OnceLock::new();
        *RESOLVED.get_or_init(|| {
            let mut limits = Limits::default();
            if let Some(v) = read_env("TENSORFUZZ_MAX_RANK") {
                limits.max_rank = v.clamp(1, 8);
            }
            if let Some(v) = read_env("TENSORFUZZ_MAX_DIM") {
                limits.max_dim = v.max(limits.min_dim);
            }
            if let Some(v) = read_env("TENSORFUZZ_MAX_ELEMS") {
                limits.max_elems = v.max(1);
            }
            limits
        })
    }
}

fn read_env(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable decode limit override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_modest() {
        let limits = Limits::default();
        assert!(limits.min_dim >= 1);
        assert!(limits.max_dim >= limits.min_dim);
        assert!(limits.max_rank >= 1);
        let worst = limits.max_dim.pow(limits.max_rank as u32);
        assert!(worst <= limits.max_elems);
    }
}
