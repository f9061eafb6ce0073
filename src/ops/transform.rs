//! Layout transforms: reversing an axis
//!
//! A transform either returns a new tensor and leaves its input alone, or
//! rewrites the input's storage in place. In-place writes go to the shared
//! buffer and are visible through every view of it; callers holding views on
//! several threads must serialize those calls themselves.

use crate::dtype::dispatch_dtype;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

fn resolve_axis(a: &Tensor, axis: isize) -> Result<usize> {
    a.layout().normalize_dim(axis).ok_or(Error::AxisOutOfRange {
        axis,
        ndim: a.ndim(),
    })
}

/// Copy of `a` with `axis` reversed
///
/// The result is contiguous and owns fresh storage.
///
/// # Errors
///
/// `AxisOutOfRange` if `axis` is outside `[-ndim, ndim)`.
pub fn flip(a: &Tensor, axis: isize) -> Result<Tensor> {
    let dim = resolve_axis(a, axis)?;
    let layout = a
        .layout()
        .flip(dim)
        .ok_or(Error::AxisOutOfRange { axis, ndim: a.ndim() })?;
    Tensor::from_parts(a.storage().clone(), layout)?.deep_copy()
}

/// Reverse `axis` of `a` by swapping mirrored elements in its storage
///
/// Only the elements addressed by `a` move; the rest of a shared buffer is
/// untouched.
///
/// # Errors
///
/// `AxisOutOfRange` if `axis` is outside `[-ndim, ndim)`.
pub fn flip_in_place(a: &Tensor, axis: isize) -> Result<()> {
    let dim = resolve_axis(a, axis)?;
    let half = a.shape()[dim] / 2;
    if half == 0 || a.numel() == 0 {
        return Ok(());
    }

    let layout = a.layout();
    let (Some(front), Some(back)) = (
        layout.narrow(dim, 0, half),
        layout.flip(dim).and_then(|l| l.narrow(dim, 0, half)),
    ) else {
        return Err(Error::AxisOutOfRange { axis, ndim: a.ndim() });
    };

    if !a.storage().is_unique() {
        tracing::debug!(
            refs = a.storage().ref_count(),
            "flipping shared storage in place; all views observe the change"
        );
    }

    dispatch_dtype!(a.dtype(), T => {
        a.storage().with_slice_mut::<T, _>(|data| {
            for (i, j) in front.offsets_iter().zip(back.offsets_iter()) {
                data.swap(i, j);
            }
        })
    })
}

fn flip_with_mode(a: &Tensor, op: &'static str, axis: isize, in_place: bool) -> Result<Option<Tensor>> {
    if a.ndim() == 0 {
        return Err(Error::rank(op, 1, 0));
    }
    if in_place {
        flip_in_place(a, axis)?;
        Ok(None)
    } else {
        flip(a, axis).map(Some)
    }
}

/// Reverse the last axis
///
/// Returns `Some(copy)` when `in_place` is false. With `in_place` the storage
/// of `a` is rewritten and `None` is returned.
///
/// # Errors
///
/// `RankError` for rank-0 tensors.
///
/// # Example
///
/// ```
/// use tensile::prelude::*;
///
/// let a = Tensor::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]);
/// let b = tensile::ops::fliplr(&a, false)?.expect("copying flip returns a tensor");
/// assert_eq!(b.to_vec::<i32>(), vec![3, 2, 1, 6, 5, 4]);
///
/// assert!(tensile::ops::fliplr(&a, true)?.is_none());
/// assert_eq!(a.to_vec::<i32>(), vec![3, 2, 1, 6, 5, 4]);
/// # Ok::<(), tensile::error::Error>(())
/// ```
pub fn fliplr(a: &Tensor, in_place: bool) -> Result<Option<Tensor>> {
    flip_with_mode(a, "fliplr", -1, in_place)
}

/// Reverse the first axis; otherwise identical to [`fliplr`]
pub fn flipud(a: &Tensor, in_place: bool) -> Result<Option<Tensor>> {
    flip_with_mode(a, "flipud", 0, in_place)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::tensor::Layout;

    fn grid() -> Tensor {
        Tensor::arange(6, DType::I32).unwrap().reshape(&[2, 3]).unwrap()
    }

    #[test]
    fn test_flip_copies() {
        let a = grid();
        let b = flip(&a, 1).unwrap();
        assert_eq!(b.to_vec::<i32>(), vec![2, 1, 0, 5, 4, 3]);
        assert!(b.is_contiguous());
        assert!(!b.shares_storage(&a));
        assert_eq!(a.to_vec::<i32>(), vec![0, 1, 2, 3, 4, 5]);

        let c = flip(&a, -2).unwrap();
        assert_eq!(c.to_vec::<i32>(), vec![3, 4, 5, 0, 1, 2]);
    }

    #[test]
    fn test_flip_in_place_odd_and_even() {
        let a = Tensor::arange(5, DType::F32).unwrap();
        flip_in_place(&a, 0).unwrap();
        assert_eq!(a.to_vec::<f32>(), vec![4.0, 3.0, 2.0, 1.0, 0.0]);

        let b = Tensor::arange(4, DType::U8).unwrap();
        flip_in_place(&b, 0).unwrap();
        assert_eq!(b.to_vec::<u8>(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_flip_in_place_is_visible_through_views() {
        let a = grid();
        let flat = a.reshape(&[6]).unwrap();
        assert!(flat.shares_storage(&a));
        flip_in_place(&a, 1).unwrap();
        assert_eq!(flat.to_vec::<i32>(), vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn test_flip_in_place_on_strided_view() {
        // Transposed view of a 2x3 grid: shape [3, 2], strides [1, 3]
        let a = grid();
        let layout = Layout::new([3, 2].into(), [1, 3].into(), 0).unwrap();
        let t = Tensor::from_parts(a.storage().clone(), layout).unwrap();
        flip_in_place(&t, 1).unwrap();
        assert_eq!(t.to_vec::<i32>(), vec![3, 0, 4, 1, 5, 2]);
        assert_eq!(a.to_vec::<i32>(), vec![3, 4, 5, 0, 1, 2]);
    }

    #[test]
    fn test_flip_bad_axis() {
        let a = grid();
        assert_eq!(flip(&a, 2).unwrap_err(), Error::AxisOutOfRange { axis: 2, ndim: 2 });
        assert_eq!(
            flip_in_place(&a, -3).unwrap_err(),
            Error::AxisOutOfRange { axis: -3, ndim: 2 }
        );
    }

    #[test]
    fn test_fliplr_rank0() {
        let s = Tensor::from_slice(&[1.0f64], &[]);
        assert!(matches!(fliplr(&s, false), Err(Error::RankError { .. })));
        assert!(matches!(flipud(&s, true), Err(Error::RankError { .. })));
    }

    #[test]
    fn test_flipud() {
        let a = grid();
        let b = flipud(&a, false).unwrap().unwrap();
        assert_eq!(b.to_vec::<i32>(), vec![3, 4, 5, 0, 1, 2]);
    }
}
