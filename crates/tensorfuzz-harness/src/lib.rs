// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz harnesses over the tensor stack
//!
//! One module per fuzzed operation, all with the same shape:
//!
//! 1. guard on a per-operation minimum input length,
//! 2. decode parameters and tensor contents through `tensorfuzz-input`,
//! 3. invoke the operation (through the graph layer or directly),
//! 4. classify the result as [`Outcome::Accepted`] or [`Outcome::Anomaly`].
//!
//! Library rejections whose [`ErrorClass`] appears in the operation's
//! expected set are part of normal fuzzing; everything else — unexpected
//! error classes and post-condition violations — is an anomaly the driver
//! should record. `Outcome::status` preserves the classic `0` / `-1`
//! integer contract of fuzz entry points.

pub mod classify;
pub mod ops;
pub mod outcome;

pub use classify::ErrorClass;
pub use outcome::{AnomalyReport, Outcome};
