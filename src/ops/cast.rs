//! Element-wise dtype conversion and strided copies

use crate::dtype::{DType, Element, convert, dispatch_dtype};
use crate::error::Result;
use crate::tensor::storage::try_vec;
use crate::tensor::{Storage, Tensor};

/// Convert every element of `a` to `dtype`, producing a new contiguous tensor
///
/// The result never shares storage with `a`, even when `dtype` already
/// matches. Rounding follows [`Element`]: float targets round to nearest even,
/// float-to-integer truncates toward zero and saturates (NaN becomes 0), and
/// integer-to-integer wraps.
///
/// Every pair of numeric dtypes is convertible, so this only fails when the
/// output cannot be allocated.
///
/// # Example
///
/// ```
/// use tensile::prelude::*;
///
/// let a = Tensor::from_slice(&[1.7f64, -1.7, 300.0], &[3]);
/// let b = tensile::ops::cast(&a, DType::U8)?;
/// assert_eq!(b.to_vec::<u8>(), vec![1, 0, 255]);
/// # Ok::<(), tensile::error::Error>(())
/// ```
pub fn cast(a: &Tensor, dtype: DType) -> Result<Tensor> {
    tracing::trace!(from = %a.dtype(), to = %dtype, numel = a.numel(), "cast");
    let storage = dispatch_dtype!(a.dtype(), S => {
        dispatch_dtype!(dtype, D => {
            Storage::from_vec(gather::<S, D>(a)?)
        })
    });
    Ok(Tensor::from_contiguous(storage, a.shape()))
}

/// Elements of `a` in logical row-major order, converted from `S` to `D`
pub(crate) fn gather<S: Element, D: Element>(a: &Tensor) -> Result<Vec<D>> {
    let numel = a.numel();
    let mut out = try_vec::<D>(numel)?;

    if a.is_contiguous() {
        let start = a.offset();
        a.storage().with_slice::<S, _>(|src| {
            out.extend(src[start..start + numel].iter().map(|&v| convert::<S, D>(v)));
        })?;
    } else {
        a.storage().with_slice::<S, _>(|src| {
            out.extend(a.layout().offsets_iter().map(|o| convert::<S, D>(src[o])));
        })?;
    }
    Ok(out)
}

/// Write the contiguous `values` into `dst` element by element, converting to
/// `dst`'s dtype. Shapes must already agree.
///
/// `values` is converted in full before `dst`'s storage is locked for writing,
/// so `dst` may alias the tensor `values` was computed from.
pub(crate) fn assign(dst: &Tensor, values: &Tensor) -> Result<()> {
    debug_assert_eq!(dst.shape(), values.shape());
    dispatch_dtype!(values.dtype(), S => {
        dispatch_dtype!(dst.dtype(), D => {
            let converted = gather::<S, D>(values)?;
            dst.storage().with_slice_mut::<D, _>(|out| {
                for (o, v) in dst.layout().offsets_iter().zip(converted) {
                    out[o] = v;
                }
            })
        })
    })
}
