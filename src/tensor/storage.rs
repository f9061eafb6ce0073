//! Storage: reference-counted element buffers shared between tensor views

use crate::dtype::{DType, Element, dispatch_dtype};
use crate::error::{Error, Result};
use half::{bf16, f16};
use parking_lot::RwLock;
use std::sync::Arc;

/// Typed element data owned by a [`Storage`]
///
/// One variant per [`DType`]; the variant always agrees with the storage's tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Buffer {
    /// f64 elements
    F64(Vec<f64>),
    /// f32 elements
    F32(Vec<f32>),
    /// f16 elements
    F16(Vec<f16>),
    /// bf16 elements
    BF16(Vec<bf16>),
    /// i64 elements
    I64(Vec<i64>),
    /// i32 elements
    I32(Vec<i32>),
    /// i16 elements
    I16(Vec<i16>),
    /// i8 elements
    I8(Vec<i8>),
    /// u64 elements
    U64(Vec<u64>),
    /// u32 elements
    U32(Vec<u32>),
    /// u16 elements
    U16(Vec<u16>),
    /// u8 elements
    U8(Vec<u8>),
}

impl Buffer {
    /// Zero-filled buffer of `len` elements
    pub fn zeros(dtype: DType, len: usize) -> Result<Self> {
        dispatch_dtype!(dtype, T => {
            let mut data = try_vec::<T>(len)?;
            data.resize(len, T::zero());
            Ok(T::into_buffer(data))
        })
    }

    /// Element type stored in this buffer
    pub fn dtype(&self) -> DType {
        match self {
            Self::F64(_) => DType::F64,
            Self::F32(_) => DType::F32,
            Self::F16(_) => DType::F16,
            Self::BF16(_) => DType::BF16,
            Self::I64(_) => DType::I64,
            Self::I32(_) => DType::I32,
            Self::I16(_) => DType::I16,
            Self::I8(_) => DType::I8,
            Self::U64(_) => DType::U64,
            Self::U32(_) => DType::U32,
            Self::U16(_) => DType::U16,
            Self::U8(_) => DType::U8,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        dispatch_dtype!(self.dtype(), T => {
            T::slice(self).map_or(0, <[T]>::len)
        })
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reserve room for `len` elements without aborting on allocation failure
pub(crate) fn try_vec<T>(len: usize) -> Result<Vec<T>> {
    let size = len
        .checked_mul(std::mem::size_of::<T>())
        .ok_or(Error::OutOfMemory { size: usize::MAX })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { size })?;
    Ok(data)
}

/// Storage for tensor data
///
/// Cloning a `Storage` is cheap: clones share the same buffer, and the buffer
/// is released when the last clone is dropped. Writes through any clone (the
/// explicit in-place operations) are visible through every other clone.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    buffer: RwLock<Buffer>,
    len: usize,
    dtype: DType,
}

impl Storage {
    /// Allocate zero-filled storage for `len` elements of `dtype`
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the byte size overflows or the allocator
    /// refuses the request.
    pub fn allocate(dtype: DType, len: usize) -> Result<Self> {
        tracing::trace!(len, %dtype, "allocating storage");
        Ok(Self::from_buffer(Buffer::zeros(dtype, len)?))
    }

    /// Take ownership of a typed vector
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self::from_buffer(T::into_buffer(data))
    }

    /// Copy a typed slice into new storage
    pub fn from_slice<T: Element>(data: &[T]) -> Result<Self> {
        let mut owned = try_vec::<T>(data.len())?;
        owned.extend_from_slice(data);
        Ok(Self::from_vec(owned))
    }

    /// Build storage from raw native-endian element bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the byte count is not a multiple of the
    /// element size.
    pub fn from_bytes(bytes: &[u8], dtype: DType) -> Result<Self> {
        let elem_size = dtype.size_in_bytes();
        if bytes.len() % elem_size != 0 {
            return Err(Error::invalid_argument(
                "bytes",
                format!(
                    "{} bytes is not a whole number of {dtype} elements",
                    bytes.len()
                ),
            ));
        }
        dispatch_dtype!(dtype, T => {
            let data: Vec<T> = bytemuck::pod_collect_to_vec(bytes);
            Ok(Self::from_vec(data))
        })
    }

    /// Wrap an existing buffer
    pub fn from_buffer(buffer: Buffer) -> Self {
        let len = buffer.len();
        let dtype = buffer.dtype();
        Self {
            inner: Arc::new(StorageInner {
                buffer: RwLock::new(buffer),
                len,
                dtype,
            }),
        }
    }

    /// Copy the elements out as native-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let buffer = self.inner.buffer.read();
        dispatch_dtype!(self.dtype(), T => {
            T::slice(&buffer).map_or_else(Vec::new, |data| bytemuck::cast_slice::<T, u8>(data).to_vec())
        })
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Whether the storage holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Get reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Whether two handles refer to the same buffer
    #[inline]
    pub fn same_buffer(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the element at flat `index` as f64
    pub fn get_f64(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        dispatch_dtype!(self.dtype(), T => {
            self.with_slice::<T, _>(|data| data[index].to_f64())
        })
    }

    /// Write `value` (converted to the storage dtype) at flat `index`
    pub fn set_f64(&self, index: usize, value: f64) -> Result<()> {
        self.check_index(index)?;
        dispatch_dtype!(self.dtype(), T => {
            self.with_slice_mut::<T, _>(|data| data[index] = T::from_f64(value))
        })
    }

    /// Run `f` on the elements, typed as `T`
    ///
    /// # Errors
    ///
    /// Returns `DTypeMismatch` if the storage does not hold `T`.
    pub fn with_slice<T: Element, R>(&self, f: impl FnOnce(&[T]) -> R) -> Result<R> {
        let buffer = self.inner.buffer.read();
        let data = T::slice(&buffer).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })?;
        Ok(f(data))
    }

    /// Run `f` on the elements mutably, typed as `T`
    ///
    /// Holds the buffer's write lock for the duration of `f`; the mutation is
    /// visible through every tensor sharing this storage.
    pub fn with_slice_mut<T: Element, R>(&self, f: impl FnOnce(&mut [T]) -> R) -> Result<R> {
        let mut buffer = self.inner.buffer.write();
        let got = self.dtype();
        let data = T::slice_mut(&mut buffer).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got,
        })?;
        Ok(f(data))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        tracing::trace!(len = self.len, dtype = %self.dtype, "releasing storage");
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
