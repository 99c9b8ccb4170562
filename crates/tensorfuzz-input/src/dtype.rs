// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded element-type enumeration for decoded tensors.

use candle_core::DType;

/// Element types a selector byte can map onto.
///
/// The variant order is the selector order: an all-zero input decodes to
/// `F32`, the first entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    F64,
    F16,
    BF16,
    U8,
    U32,
    I64,
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        ElementType::F32,
        ElementType::F64,
        ElementType::F16,
        ElementType::BF16,
        ElementType::U8,
        ElementType::U32,
        ElementType::I64,
    ];

    /// Map a raw selector byte onto a variant. Total: any byte is valid.
    pub fn from_selector(raw: u8) -> Self {
        Self::ALL[raw as usize % Self::ALL.len()]
    }

    /// Restrict the selector to floating-point variants, for operations
    /// that reject integer inputs outright.
    pub fn float_from_selector(raw: u8) -> Self {
        const FLOATS: [ElementType; 4] =
            [ElementType::F32, ElementType::F64, ElementType::F16, ElementType::BF16];
        FLOATS[raw as usize % FLOATS.len()]
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::F16 | ElementType::BF16 => 2,
            ElementType::F32 | ElementType::U32 => 4,
            ElementType::F64 | ElementType::I64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            ElementType::F32 | ElementType::F64 | ElementType::F16 | ElementType::BF16
        )
    }

    pub fn to_dtype(self) -> DType {
        match self {
            ElementType::F32 => DType::F32,
            ElementType::F64 => DType::F64,
            ElementType::F16 => DType::F16,
            ElementType::BF16 => DType::BF16,
            ElementType::U8 => DType::U8,
            ElementType::U32 => DType::U32,
            ElementType::I64 => DType::I64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_zero_is_f32() {
        assert_eq!(ElementType::from_selector(0), ElementType::F32);
    }

    #[test]
    fn selector_covers_all_bytes() {
        for raw in 0..=255u8 {
            let et = ElementType::from_selector(raw);
            assert!(ElementType::ALL.contains(&et));
            assert!(ElementType::float_from_selector(raw).is_float());
        }
    }

    #[test]
    fn sizes_agree_with_dtype() {
        for et in ElementType::ALL {
            assert_eq!(et.size_in_bytes(), et.to_dtype().size_in_bytes());
        }
    }
}
