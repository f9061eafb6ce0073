//! Data type system for tensile tensors
//!
//! This module provides the closed `DType` enum naming every supported element
//! type, the `Element` trait that ties Rust primitives to those tags, and the
//! accumulation precision used by norm reductions.

mod dispatch;
mod element;

pub(crate) use dispatch::dispatch_dtype;
pub(crate) use element::convert;
pub use element::Element;

use std::fmt;

// ============================================================================
// Accumulation Precision
// ============================================================================

/// Accumulation precision for norm reductions.
///
/// Sums of powers are accumulated in this precision and only cast to the output
/// dtype once per output position. The accumulator must be at least as wide as
/// the output dtype, so `F32` is rejected for `F64` outputs.
///
/// | Precision | Decimal Digits | Valid outputs |
/// |-----------|----------------|---------------|
/// | **F64**   | ~15-16         | every float dtype (default) |
/// | **F32**   | ~7             | F32, F16, BF16 |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AccumulationPrecision {
    /// Accumulate in F64
    #[default]
    F64,
    /// Accumulate in F32 (faster, for f32 and half-precision outputs)
    F32,
}

impl AccumulationPrecision {
    /// Whether this accumulator is at least as wide as `dtype`
    pub const fn covers(self, dtype: DType) -> bool {
        match self {
            Self::F64 => true,
            Self::F32 => !matches!(dtype, DType::F64 | DType::I64 | DType::U64),
        }
    }
}

// ============================================================================
// DType Enum
// ============================================================================

/// Element types supported by tensile tensors
///
/// The tag travels with every tensor at runtime. Kernels are generic over
/// [`Element`] and the concrete type is resolved from the tag at the call
/// boundary.
///
/// Discriminants are grouped by family:
/// - Floats: 0-9 (F64=0, F32=1, F16=2, BF16=3)
/// - Signed ints: 10-19 (I64=10, I32=11, I16=12, I8=13)
/// - Unsigned ints: 20-29 (U64=20, U32=21, U16=22, U8=23)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point ("double")
    F64 = 0,
    /// 32-bit floating point ("float")
    F32 = 1,
    /// 16-bit floating point, IEEE 754 binary16 ("half")
    F16 = 2,
    /// 16-bit brain floating point
    BF16 = 3,

    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 16-bit signed integer
    I16 = 12,
    /// 8-bit signed integer
    I8 = 13,

    /// 64-bit unsigned integer
    U64 = 20,
    /// 32-bit unsigned integer
    U32 = 21,
    /// 16-bit unsigned integer
    U16 = 22,
    /// 8-bit unsigned integer
    U8 = 23,
}

impl DType {
    /// Every supported dtype, floats first
    pub const ALL: [DType; 12] = [
        Self::F64,
        Self::F32,
        Self::F16,
        Self::BF16,
        Self::I64,
        Self::I32,
        Self::I16,
        Self::I8,
        Self::U64,
        Self::U32,
        Self::U16,
        Self::U8,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 => 1,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::F16 | Self::BF16)
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::I16 | Self::I8)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U64 | Self::U32 | Self::U16 | Self::U8)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns true if this type can represent negative values
    #[inline]
    pub const fn is_signed(self) -> bool {
        self.is_float() || self.is_signed_int()
    }

    /// Short name for display (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
        assert_eq!(DType::I8.size_in_bytes(), 1);
        assert_eq!(DType::U64.size_in_bytes(), 8);
    }

    #[test]
    fn test_dtype_families() {
        for dtype in DType::ALL {
            assert_ne!(dtype.is_float(), dtype.is_int(), "{dtype}");
        }
        assert!(DType::F16.is_signed());
        assert!(DType::I16.is_signed());
        assert!(!DType::U16.is_signed());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::F16.to_string(), "f16");
        assert_eq!(format!("{}", DType::U32), "u32");
    }

    #[test]
    fn test_accumulation_covers() {
        assert!(AccumulationPrecision::F64.covers(DType::F64));
        assert!(AccumulationPrecision::F32.covers(DType::F16));
        assert!(AccumulationPrecision::F32.covers(DType::F32));
        assert!(!AccumulationPrecision::F32.covers(DType::F64));
        assert_eq!(AccumulationPrecision::default(), AccumulationPrecision::F64);
    }
}
