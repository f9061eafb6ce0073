//! Core Tensor type

use super::{Layout, Shape, Storage, checked_product};
use crate::dtype::{AccumulationPrecision, DType, Element, convert, dispatch_dtype};
use crate::error::{Error, Result};
use crate::ops::{self, Axes};
use crate::tensor::storage::try_vec;
use std::fmt;

/// N-dimensional array stored on the CPU
///
/// A tensor is a [`Layout`] (shape, strides, offset) over a shared
/// [`Storage`]. Cloning a tensor is cheap and yields a view of the same
/// storage; use [`Tensor::deep_copy`] for an independent buffer.
///
/// # Aliasing
///
/// Views created by [`Tensor::reshape`] (on contiguous input), [`Tensor::view`]
/// and `clone` share storage. Explicit in-place operations such as
/// `fliplr(true)` mutate that storage, so the change is visible through every
/// view of it.
///
/// # Example
///
/// ```
/// use tensile::prelude::*;
///
/// let a = Tensor::arange(24, DType::F32)?.reshape(&[2, 3, 4])?;
/// let n = a.norm2([0, 1], false)?;
/// assert_eq!(n.shape(), &[4]);
/// # Ok::<(), tensile::error::Error>(())
/// ```
#[derive(Clone)]
pub struct Tensor {
    /// Underlying memory storage
    storage: Storage,
    /// Memory layout (shape, strides, offset)
    layout: Layout,
}

impl Tensor {
    // ===== Construction =====

    /// Create a tensor from storage and layout
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the layout can address an element outside
    /// the storage.
    pub fn from_parts(storage: Storage, layout: Layout) -> Result<Self> {
        if checked_product(layout.shape()).is_none() {
            return Err(Error::invalid_argument(
                "layout",
                format!("{layout:?} has more elements than fit in usize"),
            ));
        }
        if let Some((lo, hi)) = layout.addressable_range() {
            if lo < 0 || hi as usize >= storage.len() {
                return Err(Error::invalid_argument(
                    "layout",
                    format!(
                        "{layout:?} addresses [{lo}, {hi}] but storage holds {} elements",
                        storage.len()
                    ),
                ));
            }
        }
        Ok(Self { storage, layout })
    }

    /// Wrap freshly produced contiguous data
    pub(crate) fn from_contiguous(storage: Storage, shape: &[usize]) -> Self {
        debug_assert_eq!(checked_product(shape), Some(storage.len()));
        Self {
            storage,
            layout: Layout::contiguous(shape),
        }
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of `shape`.
    /// Use [`Self::try_from_slice`] for a fallible alternative.
    ///
    /// # Example
    ///
    /// ```
    /// use tensile::tensor::Tensor;
    /// let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2]);
    /// assert_eq!(t.shape(), &[2, 2]);
    /// ```
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape)
            .unwrap_or_else(|e| panic!("Tensor::from_slice failed: {e}"))
    }

    /// Create a tensor from a slice of data (fallible version)
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `data.len()` does not equal the product of
    /// `shape`, or `OutOfMemory` if the copy cannot be allocated.
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::check_len(data.len(), shape)?;
        Ok(Self::from_contiguous(Storage::from_slice(data)?, shape))
    }

    /// Create a tensor that takes ownership of `data`
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        Self::check_len(data.len(), shape)?;
        Ok(Self::from_contiguous(Storage::from_vec(data), shape))
    }

    /// Create a tensor from raw native-endian element bytes
    pub fn from_bytes(bytes: &[u8], shape: &[usize], dtype: DType) -> Result<Self> {
        let storage = Storage::from_bytes(bytes, dtype)?;
        Self::check_len(storage.len(), shape)?;
        Ok(Self::from_contiguous(storage, shape))
    }

    fn check_len(len: usize, shape: &[usize]) -> Result<()> {
        if checked_product(shape) != Some(len) {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![len],
            });
        }
        Ok(())
    }

    /// Element count of a new tensor; a product past `usize::MAX` can never
    /// be allocated
    fn checked_numel(shape: &[usize]) -> Result<usize> {
        checked_product(shape).ok_or(Error::OutOfMemory { size: usize::MAX })
    }

    /// Create a tensor filled with zeros
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails. Use [`Self::try_zeros`] for a fallible
    /// alternative.
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        Self::try_zeros(shape, dtype).unwrap_or_else(|e| panic!("Tensor::zeros failed: {e}"))
    }

    /// Create a tensor filled with zeros (fallible version)
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if the element count overflows or the buffer cannot be
    /// allocated.
    pub fn try_zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        let numel = Self::checked_numel(shape)?;
        Ok(Self::from_contiguous(Storage::allocate(dtype, numel)?, shape))
    }

    /// Create a tensor filled with ones
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails. Use [`Self::try_ones`] for a fallible
    /// alternative.
    pub fn ones(shape: &[usize], dtype: DType) -> Self {
        Self::try_ones(shape, dtype).unwrap_or_else(|e| panic!("Tensor::ones failed: {e}"))
    }

    /// Create a tensor filled with ones (fallible version)
    pub fn try_ones(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::try_full_scalar(shape, dtype, 1.0)
    }

    /// Create a tensor filled with `value`, converted to `dtype`
    pub fn try_full_scalar(shape: &[usize], dtype: DType, value: f64) -> Result<Self> {
        let numel = Self::checked_numel(shape)?;
        let storage = dispatch_dtype!(dtype, T => {
            let mut data = try_vec::<T>(numel)?;
            data.resize(numel, T::from_f64(value));
            Storage::from_vec(data)
        });
        Ok(Self::from_contiguous(storage, shape))
    }

    /// Rank-1 tensor holding `0, 1, ..., count - 1` converted to `dtype`
    ///
    /// Integer dtypes wrap values that exceed their range.
    pub fn arange(count: usize, dtype: DType) -> Result<Self> {
        let storage = dispatch_dtype!(dtype, T => {
            let mut data = try_vec::<T>(count)?;
            data.extend((0..count).map(|i| convert::<i64, T>(i as i64)));
            Storage::from_vec(data)
        });
        Ok(Self::from_contiguous(storage, &[count]))
    }

    // ===== Accessors =====

    /// Get the underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the base offset into storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Check if this is a scalar (0-dimensional tensor)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.layout.is_scalar()
    }

    /// Get size along a dimension (supports negative indexing)
    pub fn size(&self, dim: isize) -> Option<usize> {
        self.layout.dim(dim)
    }

    /// Whether `self` and `other` are views of the same storage
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.same_buffer(&other.storage)
    }

    // ===== View Operations (Zero-Copy) =====

    /// Reshape, inferring at most one dimension given as `-1`
    ///
    /// Contiguous tensors are reshaped as a view of the same storage.
    /// Non-contiguous tensors are first copied into a fresh row-major buffer.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if the element counts differ
    /// - `InvalidArgument` for malformed shapes (see [`Shape::resolve`])
    pub fn reshape(&self, shape: &[isize]) -> Result<Self> {
        let resolved = Shape::resolve(self.numel(), shape)?;
        match self.layout.reshape(&resolved) {
            Some(layout) => Ok(Self {
                storage: self.storage.clone(),
                layout,
            }),
            None => {
                tracing::debug!(
                    from = ?self.shape(),
                    to = ?resolved.as_slice(),
                    "reshape of non-contiguous tensor copies its elements"
                );
                let copy = self.contiguous()?;
                Ok(Self {
                    layout: Layout::contiguous(&resolved),
                    storage: copy.storage,
                })
            }
        }
    }

    /// Reshape as a view; never copies
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the tensor is not contiguous, plus the
    /// errors of [`Self::reshape`].
    pub fn view(&self, shape: &[isize]) -> Result<Self> {
        let resolved = Shape::resolve(self.numel(), shape)?;
        let layout = self.layout.reshape(&resolved).ok_or_else(|| {
            Error::invalid_argument(
                "shape",
                format!("cannot view non-contiguous {:?} without a copy", self.layout),
            )
        })?;
        Ok(Self {
            storage: self.storage.clone(),
            layout,
        })
    }

    /// Flatten to 1D
    pub fn flatten(&self) -> Result<Self> {
        self.reshape(&[-1])
    }

    // ===== Copies =====

    /// Make tensor contiguous (copy if needed)
    ///
    /// Already-contiguous tensors are returned as a view.
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        self.deep_copy()
    }

    /// Copy into a new, unshared, row-major buffer
    pub fn deep_copy(&self) -> Result<Self> {
        ops::cast(self, self.dtype())
    }

    /// Convert elements to `dtype` (always a new buffer)
    pub fn to_dtype(&self, dtype: DType) -> Result<Self> {
        ops::cast(self, dtype)
    }

    // ===== Element Access =====

    /// Elements in logical row-major order, converted to `T`
    pub fn try_to_vec<T: Element>(&self) -> Result<Vec<T>> {
        dispatch_dtype!(self.dtype(), S => {
            ops::cast::gather::<S, T>(self)
        })
    }

    /// Elements in logical row-major order, converted to `T`
    ///
    /// # Panics
    ///
    /// Panics if the output vector cannot be allocated. Use
    /// [`Self::try_to_vec`] for a fallible alternative.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.try_to_vec()
            .unwrap_or_else(|e| panic!("Tensor::to_vec failed: {e}"))
    }

    /// Elements in logical row-major order as f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.to_vec()
    }

    /// Value of a single-element tensor
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the tensor does not hold exactly one element.
    pub fn item<T: Element>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![1],
                got: self.shape().to_vec(),
            });
        }
        let offset = self.offset();
        dispatch_dtype!(self.dtype(), S => {
            self.storage.with_slice::<S, _>(|data| convert::<S, T>(data[offset]))
        })
    }

    /// Element at `indices`, as f64
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the number of indices differs from the rank
    /// - `IndexOutOfRange` if any index is past its dimension
    pub fn get(&self, indices: &[usize]) -> Result<f64> {
        if indices.len() != self.ndim() {
            return Err(Error::invalid_argument(
                "indices",
                format!("expected {} indices, got {}", self.ndim(), indices.len()),
            ));
        }
        for (&index, &len) in indices.iter().zip(self.shape()) {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        let offset = self
            .layout
            .index(indices)
            .ok_or_else(|| Error::invalid_argument("indices", format!("{indices:?}")))?;
        self.storage.get_f64(offset)
    }

    // ===== Transforms =====

    /// Reverse the last axis
    ///
    /// With `in_place` the shared storage is mutated (visible through every
    /// view of it) and `None` is returned; otherwise a new tensor is returned
    /// and `self` is untouched.
    ///
    /// # Errors
    ///
    /// Returns `RankError` for rank-0 tensors.
    pub fn fliplr(&self, in_place: bool) -> Result<Option<Self>> {
        ops::fliplr(self, in_place)
    }

    /// Reverse the first axis, with the same contract as [`Self::fliplr`]
    pub fn flipud(&self, in_place: bool) -> Result<Option<Self>> {
        ops::flipud(self, in_place)
    }

    // ===== Reductions =====

    /// Minimum over `axes`; see [`ops::minimum`]
    pub fn minimum(&self, axes: impl Into<Axes>, keepdim: bool) -> Result<Self> {
        ops::minimum(self, axes, keepdim)
    }

    /// Maximum over `axes`; see [`ops::maximum`]
    pub fn maximum(&self, axes: impl Into<Axes>, keepdim: bool) -> Result<Self> {
        ops::maximum(self, axes, keepdim)
    }

    /// p-norm over `axes`; see [`ops::norm`]
    pub fn norm(&self, p: f64, axes: impl Into<Axes>, keepdim: bool) -> Result<Self> {
        ops::norm(self, p, axes, keepdim)
    }

    /// p-norm with an explicit accumulation precision
    pub fn norm_with_precision(
        &self,
        p: f64,
        axes: impl Into<Axes>,
        keepdim: bool,
        precision: AccumulationPrecision,
    ) -> Result<Self> {
        ops::norm_with_precision(self, p, axes, keepdim, precision)
    }

    /// Euclidean norm over `axes`; see [`ops::norm2`]
    pub fn norm2(&self, axes: impl Into<Axes>, keepdim: bool) -> Result<Self> {
        ops::norm2(self, axes, keepdim)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .field("dtype", &self.dtype())
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Strides;

    fn transposed() -> Tensor {
        // [[0, 1, 2], [3, 4, 5]] viewed as its 3x2 transpose
        let base = Tensor::arange(6, DType::F64).unwrap();
        let layout = Layout::new(Shape::from([3, 2]), Strides::from([1, 3]), 0).unwrap();
        Tensor::from_parts(base.storage().clone(), layout).unwrap()
    }

    #[test]
    fn test_arange() {
        let t = Tensor::arange(5, DType::I32).unwrap();
        assert_eq!(t.shape(), &[5]);
        assert_eq!(t.to_vec::<i32>(), vec![0, 1, 2, 3, 4]);

        let wrapped = Tensor::arange(258, DType::U8).unwrap();
        assert_eq!(wrapped.to_vec::<u8>()[256..], [0, 1]);

        assert_eq!(Tensor::arange(0, DType::F32).unwrap().numel(), 0);
    }

    #[test]
    fn test_zeros_and_ones() {
        let z = Tensor::zeros(&[2, 3], DType::F16);
        assert_eq!(z.to_f64_vec(), vec![0.0; 6]);
        let o = Tensor::ones(&[], DType::I8);
        assert!(o.is_scalar());
        assert_eq!(o.item::<i8>().unwrap(), 1);
    }

    #[test]
    fn test_try_from_slice_checks_len() {
        let err = Tensor::try_from_slice(&[1.0f32, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert_eq!(err, Error::shape_mismatch(&[2, 2], &[3]));
    }

    #[test]
    fn test_from_parts_checks_bounds() {
        let storage = Storage::allocate(DType::F32, 6).unwrap();
        assert!(Tensor::from_parts(storage.clone(), Layout::contiguous(&[2, 3])).is_ok());
        assert!(matches!(
            Tensor::from_parts(storage.clone(), Layout::contiguous_at(&[2, 3], 1)),
            Err(Error::InvalidArgument { arg: "layout", .. })
        ));
        assert!(Tensor::from_parts(storage, Layout::contiguous_at(&[0], 100)).is_ok());
    }

    #[test]
    fn test_reshape_contiguous_is_view() {
        let a = Tensor::arange(24, DType::F32).unwrap();
        let b = a.reshape(&[2, 3, 4]).unwrap();
        assert!(b.shares_storage(&a));
        assert_eq!(b.shape(), &[2, 3, 4]);
        assert_eq!(b.strides(), &[12, 4, 1]);
        assert_eq!(a.storage().ref_count(), 2);
    }

    #[test]
    fn test_reshape_non_contiguous_copies() {
        let t = transposed();
        assert!(!t.is_contiguous());
        let flat = t.reshape(&[-1]).unwrap();
        assert!(!flat.shares_storage(&t));
        assert_eq!(flat.to_vec::<f64>(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert!(matches!(t.view(&[6]), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_reshape_mismatch() {
        let a = Tensor::arange(24, DType::F32).unwrap();
        assert!(matches!(
            a.reshape(&[5, 5]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_get_and_item() {
        let t = transposed();
        assert_eq!(t.get(&[2, 1]).unwrap(), 5.0);
        assert_eq!(
            t.get(&[3, 0]),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(matches!(t.get(&[0]), Err(Error::InvalidArgument { .. })));
        assert!(matches!(t.item::<f64>(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_deep_copy_detaches() {
        let a = Tensor::from_slice(&[1i64, 2, 3], &[3]);
        let b = a.deep_copy().unwrap();
        assert!(!a.shares_storage(&b));
        b.storage().set_f64(0, 9.0).unwrap();
        assert_eq!(a.to_vec::<i64>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_to_vec_converts() {
        let t = Tensor::from_slice(&[1.5f32, -2.5], &[2]);
        assert_eq!(t.to_vec::<i32>(), vec![1, -2]);
        assert_eq!(t.to_vec::<f64>(), vec![1.5, -2.5]);
    }

    #[test]
    fn test_checked_numel() {
        assert_eq!(Tensor::checked_numel(&[2, 3, 4]).unwrap(), 24);
        assert_eq!(Tensor::checked_numel(&[]).unwrap(), 1);
        assert_eq!(Tensor::checked_numel(&[usize::MAX, 0]).unwrap(), 0);
        assert_eq!(
            Tensor::checked_numel(&[usize::MAX, 2]).unwrap_err(),
            Error::OutOfMemory { size: usize::MAX }
        );
        assert!(matches!(
            Tensor::try_zeros(&[usize::MAX, 2], DType::I8),
            Err(Error::OutOfMemory { .. })
        ));
    }
}
