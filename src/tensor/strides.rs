//! Strides type: element offsets for tensor memory layout

use super::shape::STACK_DIMS;
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Strides type: element offsets between consecutive elements along each dimension
/// Signed to support negative strides (e.g., for flip operations)
/// NOTE: Strides are in ELEMENTS, not bytes
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(SmallVec<[isize; STACK_DIMS]>);

impl Strides {
    /// Row-major (C-order) strides for `shape`: the last axis varies fastest.
    ///
    /// # Example
    /// ```
    /// use tensile::tensor::Strides;
    /// assert_eq!(Strides::contiguous(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
    /// ```
    ///
    /// Strides saturate at `isize::MAX`; that only happens for shapes with a
    /// zero-sized dimension, where no stride is ever used.
    pub fn contiguous(shape: &[usize]) -> Self {
        let mut strides: SmallVec<[isize; STACK_DIMS]> = SmallVec::with_capacity(shape.len());
        let mut stride = 1isize;

        // Compute strides from last dimension to first
        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride = stride.saturating_mul(isize::try_from(dim).unwrap_or(isize::MAX));
        }

        strides.reverse();
        Self(strides)
    }

    /// View strides as a slice.
    pub fn as_slice(&self) -> &[isize] {
        self.0.as_slice()
    }
}

impl Deref for Strides {
    type Target = [isize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Strides {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl fmt::Debug for Strides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&[isize]> for Strides {
    fn from(value: &[isize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[isize; N]> for Strides {
    fn from(value: [isize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<isize> for Strides {
    fn from_iter<T: IntoIterator<Item = isize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous() {
        assert_eq!(Strides::contiguous(&[]).as_slice(), &[] as &[isize]);
        assert_eq!(Strides::contiguous(&[5]).as_slice(), &[1]);
        assert_eq!(Strides::contiguous(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert_eq!(Strides::contiguous(&[3, 0, 2]).as_slice(), &[0, 2, 1]);
    }
}
