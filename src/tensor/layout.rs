//! Layout: shape, strides, and offset for tensor memory layout

use super::shape::{STACK_DIMS, Shape, checked_product};
use super::strides::Strides;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// Layout describes the memory layout of a tensor
///
/// A tensor's elements are stored in a contiguous buffer, but not necessarily
/// in row-major order. The layout specifies how to compute the memory address
/// of any element given its indices.
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting element index in the underlying storage
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use tensile::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        Self::contiguous_at(shape, 0)
    }

    /// Create a contiguous layout starting at `offset`
    pub fn contiguous_at(shape: &[usize], offset: usize) -> Self {
        Self {
            shape: Shape::from(shape),
            strides: Strides::contiguous(shape),
            offset,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    ///
    /// Returns None if shape and strides differ in length.
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Option<Self> {
        if shape.len() != strides.len() {
            return None;
        }
        Some(Self {
            shape,
            strides,
            offset,
        })
    }

    /// Create a scalar (0-dimensional) layout
    pub fn scalar() -> Self {
        Self::contiguous(&[])
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Check if the tensor is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if elements are laid out in row-major order without gaps
    ///
    /// Strides of size-1 dimensions never affect addressing and are ignored.
    /// The base offset may be anywhere in the storage.
    pub fn is_contiguous(&self) -> bool {
        if self.elem_count() == 0 {
            return true;
        }

        let mut expected = 1isize;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()).rev() {
            if dim != 1 && stride != expected {
                return false;
            }
            expected = expected.saturating_mul(dim as isize);
        }
        true
    }

    /// Get size along a specific dimension
    ///
    /// Supports negative indexing: -1 is the last dimension
    pub fn dim(&self, d: isize) -> Option<usize> {
        let idx = self.normalize_dim(d)?;
        Some(self.shape[idx])
    }

    /// Normalize a dimension index (handle negative indices)
    pub fn normalize_dim(&self, d: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let idx = if d < 0 { ndim + d } else { d };
        if idx >= 0 && idx < ndim {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Compute the storage offset for given indices
    pub fn index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.ndim() {
            return None;
        }

        let mut linear = self.offset as isize;
        for ((&idx, &dim), &stride) in indices.iter().zip(self.shape.iter()).zip(self.strides.iter())
        {
            if idx >= dim {
                return None;
            }
            linear += idx as isize * stride;
        }

        Some(linear as usize)
    }

    /// Create a reshaped layout (if contiguous)
    ///
    /// Returns None if the layout is not contiguous or element counts differ.
    /// The reshaped layout keeps the base offset.
    pub fn reshape(&self, new_shape: &[usize]) -> Option<Self> {
        if !self.is_contiguous() {
            return None;
        }

        if checked_product(new_shape) != Some(self.elem_count()) {
            return None;
        }

        Some(Self::contiguous_at(new_shape, self.offset))
    }

    /// Restrict dimension `dim` to `[start, start + len)`
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Option<Self> {
        let size = *self.shape.get(dim)?;
        if start.checked_add(len)? > size {
            return None;
        }

        let shape = self
            .shape
            .iter()
            .enumerate()
            .map(|(i, &d)| if i == dim { len } else { d })
            .collect();
        let offset = if len == 0 {
            self.offset
        } else {
            (self.offset as isize + start as isize * self.strides[dim]) as usize
        };

        Some(Self {
            shape,
            strides: self.strides.clone(),
            offset,
        })
    }

    /// Reverse dimension `dim` by negating its stride
    ///
    /// The offset moves to the last element along `dim`, so the first logical
    /// element of the flipped layout is the last one of the original.
    pub fn flip(&self, dim: usize) -> Option<Self> {
        let size = *self.shape.get(dim)?;
        let mut strides = self.strides.clone();
        let mut offset = self.offset as isize;

        if size > 0 {
            offset += (size as isize - 1) * strides[dim];
        }
        strides[dim] = -strides[dim];

        Some(Self {
            shape: self.shape.clone(),
            strides,
            offset: offset as usize,
        })
    }

    /// Storage offset of every element, in logical row-major order
    ///
    /// Allocates one `usize` per element; [`Self::offsets_iter`] walks the same
    /// sequence without the buffer.
    pub fn offsets(&self) -> Vec<usize> {
        self.offsets_iter().collect()
    }

    /// Lazy form of [`Self::offsets`]
    pub fn offsets_iter(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        StridedOffsets::new(&self.shape, &self.strides, self.offset as isize).map(|o| o as usize)
    }

    /// Lowest and highest storage offset this layout can address
    ///
    /// Returns None for layouts without elements.
    pub fn addressable_range(&self) -> Option<(isize, isize)> {
        if self.elem_count() == 0 {
            return None;
        }

        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        // Saturating, so an overflowing layout reports an out-of-range span
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let span = isize::try_from(dim - 1)
                .unwrap_or(isize::MAX)
                .saturating_mul(stride);
            if span < 0 {
                lo = lo.saturating_add(span);
            } else {
                hi = hi.saturating_add(span);
            }
        }
        Some((lo, hi))
    }
}

/// Offsets `base + Σ coord[d] * strides[d]` for every coordinate of `shape`,
/// in row-major order.
///
/// The walk updates the running offset incrementally: stepping a coordinate
/// adds its stride, wrapping it back to zero subtracts the whole extent.
pub(crate) struct StridedOffsets<'a> {
    shape: &'a [usize],
    strides: &'a [isize],
    coord: SmallVec<[usize; STACK_DIMS]>,
    offset: isize,
    remaining: usize,
}

impl<'a> StridedOffsets<'a> {
    pub(crate) fn new(shape: &'a [usize], strides: &'a [isize], base: isize) -> Self {
        Self {
            shape,
            strides,
            coord: smallvec![0; shape.len()],
            offset: base,
            remaining: checked_product(shape).unwrap_or(0),
        }
    }
}

impl Iterator for StridedOffsets<'_> {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.offset;

        if self.remaining > 0 {
            for d in (0..self.shape.len()).rev() {
                self.coord[d] += 1;
                if self.coord[d] < self.shape[d] {
                    self.offset += self.strides[d];
                    break;
                }
                self.coord[d] = 0;
                self.offset -= (self.shape[d] as isize - 1) * self.strides[d];
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedOffsets<'_> {}

/// [`StridedOffsets`] collected into a vector
pub(crate) fn strided_offsets(shape: &[usize], strides: &[isize], base: isize) -> Vec<isize> {
    StridedOffsets::new(shape, strides, base).collect()
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}
