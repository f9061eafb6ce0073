//! Element trait for mapping Rust types to DType

use super::DType;
use crate::tensor::Buffer;
use bytemuck::Pod;
use half::{bf16, f16};
use std::fmt;

mod sealed {
    pub trait Sealed {}

    impl Sealed for f64 {}
    impl Sealed for f32 {}
    impl Sealed for half::f16 {}
    impl Sealed for half::bf16 {}
    impl Sealed for i64 {}
    impl Sealed for i32 {}
    impl Sealed for i16 {}
    impl Sealed for i8 {}
    impl Sealed for u64 {}
    impl Sealed for u32 {}
    impl Sealed for u16 {}
    impl Sealed for u8 {}
}

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to the runtime [`DType`] tag. It is
/// sealed: the set of element types is closed and matches [`DType::ALL`].
///
/// # Conversions
///
/// - Float targets round to nearest (ties to even), including f16 and bf16.
/// - Integer targets of `from_f64` truncate toward zero and saturate at the
///   type's range; NaN becomes zero.
/// - Integer targets of `from_i128` wrap (two's complement), like `as`.
pub trait Element:
    sealed::Sealed + Copy + Send + Sync + Pod + PartialOrd + fmt::Debug + fmt::Display + 'static
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Exact integer value, or `None` for float types
    fn to_i128(self) -> Option<i128>;

    /// Convert from an integer value
    fn from_i128(v: i128) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Whether this value is a float NaN
    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    /// Borrow the buffer's elements if it stores this type
    fn slice(buffer: &Buffer) -> Option<&[Self]>;

    /// Mutably borrow the buffer's elements if it stores this type
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;

    /// Wrap a vector of this type into a buffer
    fn into_buffer(data: Vec<Self>) -> Buffer;
}

/// Convert one element between two element types.
///
/// Identical types are copied bit for bit. Integer sources go through `i128`
/// so that 64-bit values survive integer-to-integer casts exactly.
#[inline]
pub(crate) fn convert<S: Element, D: Element>(v: S) -> D {
    if S::DTYPE == D::DTYPE {
        return bytemuck::cast(v);
    }
    match v.to_i128() {
        Some(i) => D::from_i128(i),
        None => D::from_f64(v.to_f64()),
    }
}

macro_rules! buffer_access {
    ($variant:ident) => {
        #[inline]
        fn slice(buffer: &Buffer) -> Option<&[Self]> {
            match buffer {
                Buffer::$variant(data) => Some(data),
                _ => None,
            }
        }

        #[inline]
        fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
            match buffer {
                Buffer::$variant(data) => Some(data),
                _ => None,
            }
        }

        #[inline]
        fn into_buffer(data: Vec<Self>) -> Buffer {
            Buffer::$variant(data)
        }
    };
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        v as f64
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    buffer_access!(F64);
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }

    buffer_access!(F32);
}

// ============================================================================
// Half-precision floating point types
// ============================================================================

impl Element for f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        f16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        f16::ZERO
    }

    #[inline]
    fn one() -> Self {
        f16::ONE
    }

    #[inline]
    fn is_nan(self) -> bool {
        f16::is_nan(self)
    }

    buffer_access!(F16);
}

impl Element for bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn to_f64(self) -> f64 {
        bf16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        bf16::from_f64(v)
    }

    #[inline]
    fn to_i128(self) -> Option<i128> {
        None
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        bf16::from_f64(v as f64)
    }

    #[inline]
    fn zero() -> Self {
        bf16::ZERO
    }

    #[inline]
    fn one() -> Self {
        bf16::ONE
    }

    #[inline]
    fn is_nan(self) -> bool {
        bf16::is_nan(self)
    }

    buffer_access!(BF16);
}

// ============================================================================
// Integer types
// ============================================================================

macro_rules! impl_int_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn to_i128(self) -> Option<i128> {
                Some(self as i128)
            }

            #[inline]
            fn from_i128(v: i128) -> Self {
                v as $ty
            }

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            buffer_access!($variant);
        }
    };
}

impl_int_element!(i64, I64);
impl_int_element!(i32, I32);
impl_int_element!(i16, I16);
impl_int_element!(i8, I8);
impl_int_element!(u64, U64);
impl_int_element!(u32, U32);
impl_int_element!(u16, U16);
impl_int_element!(u8, U8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tags() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f16::DTYPE, DType::F16);
        assert_eq!(bf16::DTYPE, DType::BF16);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_float_to_int_truncates_and_saturates() {
        assert_eq!(i32::from_f64(2.9), 2);
        assert_eq!(i32::from_f64(-2.9), -2);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-1.0), 0);
        assert_eq!(i16::from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_half_rounds_to_nearest_even() {
        // 2049 lies exactly between the f16 neighbours 2048 and 2050
        assert_eq!(f16::from_f64(2049.0).to_f64(), 2048.0);
        // 2051 lies between 2050 and 2052; 2052 has the even mantissa
        assert_eq!(f16::from_f64(2051.0).to_f64(), 2052.0);
    }

    #[test]
    fn test_convert_keeps_large_integers() {
        let big = i64::MAX - 1;
        assert_eq!(convert::<i64, i64>(big), big);
        assert_eq!(convert::<i64, u64>(big), big as u64);
        assert_eq!(convert::<u64, i64>(u64::MAX), -1);
        assert_eq!(convert::<i32, i8>(300), 44);
    }

    #[test]
    fn test_convert_float_paths() {
        assert_eq!(convert::<f64, f32>(0.5), 0.5f32);
        assert_eq!(convert::<f32, i64>(-7.75), -7);
        assert_eq!(convert::<u8, f16>(200).to_f64(), 200.0);
        assert!(convert::<f64, bf16>(f64::NAN).is_nan());
    }

    #[test]
    fn test_buffer_access() {
        let mut buffer = f32::into_buffer(vec![1.0, 2.0]);
        assert_eq!(f32::slice(&buffer), Some(&[1.0f32, 2.0][..]));
        assert!(f64::slice(&buffer).is_none());
        if let Some(data) = f32::slice_mut(&mut buffer) {
            data[0] = 5.0;
        }
        assert_eq!(f32::slice(&buffer).map(|s| s[0]), Some(5.0));
    }
}
