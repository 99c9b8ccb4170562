// SPDX-License-Identifier: MIT OR Apache-2.0
//! A minimal operation graph with feed/fetch execution
//!
//! Harnesses that model graph-style workloads build a [`Graph`] out of
//! placeholders, constants and op nodes, then hand it to a [`Session`]
//! together with feed tensors and fetch ids. Evaluation is synchronous,
//! single-threaded and CPU-only; every contract violation is a typed
//! [`GraphError`], never a panic.
//!
//! Node ids are handed out in insertion order and ops may only reference
//! earlier nodes, so the node list is always topologically sorted and the
//! session can evaluate it in one pass.

pub mod error;
pub mod graph;
pub mod session;

pub use error::GraphError;
pub use graph::{BinaryKind, Graph, Node, NodeId, OpNode, ReduceKind, UnaryKind};
pub use session::Session;
