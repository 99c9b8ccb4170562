// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error classification: library failures mapped onto a small class
//! enumeration that harnesses list their expected rejections from.

use tensorfuzz_graph::GraphError;
use tensorfuzz_linalg::LinAlgError;
use tensorfuzz_quant::QuantError;

use crate::outcome::Outcome;

/// Coarse classes of library rejection. Harnesses enumerate which of these
/// are expected for their operation; anything outside the set is an
/// anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ShapeMismatch,
    DTypeMismatch,
    UnsupportedDType,
    InvalidIndex,
    MatMulContract,
    /// Graph-level contract: feeds, fetches, pool/conv geometry.
    GraphContract,
    QuantContract,
    LinAlgContract,
    SingularMatrix,
    NotPositiveDefinite,
    Io,
    Other,
}

/// Classify a tensor-library error by its rendered message.
///
/// The library's error enum is large and moves between releases; keying on
/// the stable vocabulary of its messages keeps the mapping total. Anything
/// unrecognized lands in `Other`, which harnesses treat as unexpected
/// unless they opt in.
pub fn classify_candle(err: &candle_core::Error) -> ErrorClass {
    let msg = err.to_string().to_lowercase();
    if msg.contains("matmul") {
        ErrorClass::MatMulContract
    } else if msg.contains("unsupported dtype") {
        ErrorClass::UnsupportedDType
    } else if msg.contains("dtype") {
        ErrorClass::DTypeMismatch
    } else if msg.contains("quantiz") || msg.contains("block size") {
        ErrorClass::QuantContract
    } else if msg.contains("narrow")
        || msg.contains("index")
        || msg.contains("out of range")
        || msg.contains("out-of-bounds")
        || msg.contains("out of bounds")
    {
        ErrorClass::InvalidIndex
    } else if msg.contains("shape")
        || msg.contains("broadcast")
        || msg.contains("rank")
        || msg.contains("dim")
        || msg.contains("channel")
        || msg.contains("squeeze")
        || msg.contains("cat")
    {
        ErrorClass::ShapeMismatch
    } else if msg.contains("no such file")
        || msg.contains("i/o")
        || msg.contains("io error")
        || msg.contains("permission")
    {
        ErrorClass::Io
    } else {
        ErrorClass::Other
    }
}

pub fn classify_graph(err: &GraphError) -> ErrorClass {
    match err {
        GraphError::Compute(inner) => classify_candle(inner),
        GraphError::FeedDTypeMismatch { .. } => ErrorClass::DTypeMismatch,
        GraphError::FeedShapeMismatch { .. } => ErrorClass::ShapeMismatch,
        GraphError::MissingFeed(_)
        | GraphError::UnknownNode(_)
        | GraphError::FeedTargetNotPlaceholder(_)
        | GraphError::PoolContract { .. }
        | GraphError::ConvContract { .. } => ErrorClass::GraphContract,
    }
}

pub fn classify_quant(err: &QuantError) -> ErrorClass {
    match err {
        QuantError::Tensor(inner) => classify_candle(inner),
        _ => ErrorClass::QuantContract,
    }
}

pub fn classify_linalg(err: &LinAlgError) -> ErrorClass {
    match err {
        LinAlgError::Singular => ErrorClass::SingularMatrix,
        LinAlgError::NotPositiveDefinite => ErrorClass::NotPositiveDefinite,
        LinAlgError::Tensor(inner) => classify_candle(inner),
        _ => ErrorClass::LinAlgContract,
    }
}

fn outcome_for(
    op: &'static str,
    expected: &[ErrorClass],
    class: ErrorClass,
    err: &dyn std::fmt::Display,
) -> Outcome {
    if expected.contains(&class) {
        tracing::debug!(op, %err, ?class, "expected library rejection");
        Outcome::Accepted
    } else {
        Outcome::anomaly(op, format!("unexpected {class:?}: {err}"))
    }
}

pub fn candle_outcome(
    op: &'static str,
    expected: &[ErrorClass],
    err: &candle_core::Error,
) -> Outcome {
    outcome_for(op, expected, classify_candle(err), err)
}

pub fn graph_outcome(op: &'static str, expected: &[ErrorClass], err: &GraphError) -> Outcome {
    outcome_for(op, expected, classify_graph(err), err)
}

pub fn quant_outcome(op: &'static str, expected: &[ErrorClass], err: &QuantError) -> Outcome {
    outcome_for(op, expected, classify_quant(err), err)
}

pub fn linalg_outcome(op: &'static str, expected: &[ErrorClass], err: &LinAlgError) -> Outcome {
    outcome_for(op, expected, classify_linalg(err), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device, Tensor};

    #[test]
    fn mismatched_add_classifies_as_shape() {
        let a = Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap();
        let b = Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap();
        let err = a.add(&b).unwrap_err();
        assert_eq!(classify_candle(&err), ErrorClass::ShapeMismatch);
    }

    #[test]
    fn mixed_dtype_add_classifies_as_dtype() {
        let a = Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap();
        let b = Tensor::zeros(2, DType::F64, &Device::Cpu).unwrap();
        let err = a.add(&b).unwrap_err();
        assert_eq!(classify_candle(&err), ErrorClass::DTypeMismatch);
    }

    #[test]
    fn linalg_classes_are_distinguished() {
        assert_eq!(classify_linalg(&LinAlgError::Singular), ErrorClass::SingularMatrix);
        assert_eq!(
            classify_linalg(&LinAlgError::NotPositiveDefinite),
            ErrorClass::NotPositiveDefinite
        );
        assert_eq!(classify_linalg(&LinAlgError::NonFinite), ErrorClass::LinAlgContract);
    }

    #[test]
    fn expected_classes_accept_and_others_flag() {
        let err = LinAlgError::Singular;
        let ok = linalg_outcome("op", &[ErrorClass::SingularMatrix], &err);
        assert!(ok.is_accepted());
        let bad = linalg_outcome("op", &[ErrorClass::ShapeMismatch], &err);
        assert!(bad.is_anomaly());
    }
}
