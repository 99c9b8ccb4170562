// SPDX-License-Identifier: MIT OR Apache-2.0
//! Total byte-stream decoding for fuzz harnesses
//!
//! Every harness in this workspace starts from the same problem: turn an
//! arbitrary byte slice into a structurally valid set of operation
//! parameters and tensor contents, so that *every* input maps to some call
//! into the library under test. This crate is that decoder:
//!
//! - [`InputCursor`]: a single-pass cursor over the input buffer. Reads past
//!   the end fall back to zero defaults instead of failing.
//! - [`ElementType`]: the bounded dtype enumeration selectors map onto.
//! - [`Limits`]: rank/dimension/element-count bounds, overridable through
//!   the environment for long campaigns.
//! - [`TensorDescriptor`]: dtype + shape + raw buffer, materializable as a
//!   `candle_core::Tensor`.
//!
//! Decoding never returns an error and never panics; garbage or truncated
//! input degrades to a degenerate (all-zero, rank-0) descriptor.

pub mod cursor;
pub mod descriptor;
pub mod dtype;
pub mod limits;

pub use cursor::InputCursor;
pub use descriptor::TensorDescriptor;
pub use dtype::ElementType;
pub use limits::Limits;
