//! Resolution of a runtime `DType` tag to a concrete element type.

/// Expand `$body` once per dtype with `$T` aliased to the matching Rust type.
///
/// This is how generic kernels are reached from a runtime tag: the match is
/// the only place the closed set of element types is enumerated.
///
/// # Example
///
/// ```ignore
/// dispatch_dtype!(tensor.dtype(), T => {
///     storage.with_slice::<T, _>(|data| data.len())
/// })
/// ```
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = half::f16;
                $body
            }
            $crate::dtype::DType::BF16 => {
                type $T = half::bf16;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
        }
    };
}

pub(crate) use dispatch_dtype;

#[cfg(test)]
mod tests {
    use crate::dtype::{DType, Element};

    fn tag_of<T: Element>() -> DType {
        T::DTYPE
    }

    #[test]
    fn test_dispatch_resolves_every_dtype() {
        for dtype in DType::ALL {
            let resolved = dispatch_dtype!(dtype, T => { tag_of::<T>() });
            assert_eq!(resolved, dtype);
        }
    }
}
