//! Shape type: dimensions of a tensor

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Placeholder entry in a requested shape: "infer this dimension"
pub const INFER_DIM: isize = -1;

/// Shape type: dimensions of a tensor
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty (rank 0) shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements: 1 for rank 0, 0 if any dimension is 0.
    ///
    /// Saturates at `usize::MAX`; see [`Self::checked_elem_count`].
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.checked_elem_count().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or `None` if it does not fit in `usize`
    pub fn checked_elem_count(&self) -> Option<usize> {
        checked_product(&self.0)
    }

    /// Resolve a requested shape against an element count.
    ///
    /// At most one entry may be [`INFER_DIM`]; it is replaced by whatever size
    /// makes the product equal `numel`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for more than one placeholder, any other negative
    ///   entry, or a placeholder whose size cannot be inferred because the
    ///   other entries multiply to zero
    /// - `ShapeMismatch` if the resolved product differs from `numel`, including
    ///   products too large for `usize` (reported as `usize::MAX`)
    ///
    /// # Example
    /// ```
    /// use tensile::tensor::Shape;
    /// let shape = Shape::resolve(24, &[2, -1, 4]).unwrap();
    /// assert_eq!(shape.as_slice(), &[2, 3, 4]);
    /// ```
    pub fn resolve(numel: usize, requested: &[isize]) -> Result<Self> {
        let mut infer_at = None;

        for (i, &dim) in requested.iter().enumerate() {
            if dim == INFER_DIM {
                if infer_at.replace(i).is_some() {
                    return Err(Error::invalid_argument(
                        "shape",
                        format!("only one dimension can be inferred, got {requested:?}"),
                    ));
                }
            } else if dim < 0 {
                return Err(Error::invalid_argument(
                    "shape",
                    format!("negative dimension {dim} in {requested:?}"),
                ));
            }
        }

        let mut shape: Shape = requested.iter().map(|&d| d.max(0) as usize).collect();
        if let Some(i) = infer_at {
            shape.0[i] = 1;
        }

        // Product of the explicit entries; overflow can never match `numel`
        let Some(known) = shape.checked_elem_count() else {
            return Err(Error::ShapeMismatch {
                expected: vec![numel],
                got: vec![usize::MAX],
            });
        };

        let resolved = match infer_at {
            Some(i) => {
                if known == 0 {
                    return Err(Error::invalid_argument(
                        "shape",
                        format!("cannot infer a dimension of {requested:?} next to a zero-sized one"),
                    ));
                }
                shape.0[i] = numel / known;
                known * shape.0[i]
            }
            None => known,
        };

        if resolved != numel {
            return Err(Error::ShapeMismatch {
                expected: vec![numel],
                got: vec![resolved],
            });
        }
        Ok(shape)
    }
}

/// Product of `dims` with overflow checking; any zero entry makes it 0
pub(crate) fn checked_product(dims: &[usize]) -> Option<usize> {
    if dims.contains(&0) {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elem_count() {
        assert_eq!(Shape::new().elem_count(), 1);
        assert_eq!(Shape::from([2, 3, 4]).elem_count(), 24);
        assert_eq!(Shape::from([2, 0, 4]).elem_count(), 0);
    }

    #[test]
    fn test_checked_elem_count() {
        assert_eq!(Shape::from([usize::MAX, 2]).checked_elem_count(), None);
        assert_eq!(Shape::from([usize::MAX, 2]).elem_count(), usize::MAX);
        // A zero anywhere wins, even after an overflowing prefix
        assert_eq!(Shape::from([usize::MAX, 2, 0]).checked_elem_count(), Some(0));
        assert_eq!(Shape::from([3, 5]).checked_elem_count(), Some(15));
    }

    #[test]
    fn test_resolve_explicit() {
        let shape = Shape::resolve(24, &[4, 6]).unwrap();
        assert_eq!(shape.as_slice(), &[4, 6]);
        assert_eq!(Shape::resolve(1, &[]).unwrap().ndim(), 0);
    }

    #[test]
    fn test_resolve_infer() {
        assert_eq!(Shape::resolve(24, &[-1]).unwrap().as_slice(), &[24]);
        assert_eq!(Shape::resolve(24, &[2, 3, -1]).unwrap().as_slice(), &[2, 3, 4]);
        assert_eq!(Shape::resolve(0, &[-1, 5]).unwrap().as_slice(), &[0, 5]);
    }

    #[test]
    fn test_resolve_errors() {
        assert!(matches!(
            Shape::resolve(24, &[-1, -1]),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            Shape::resolve(24, &[-2, 12]),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            Shape::resolve(0, &[0, -1]),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(
            Shape::resolve(24, &[5, -1]),
            Err(Error::ShapeMismatch {
                expected: vec![24],
                got: vec![20],
            })
        );
        assert!(matches!(
            Shape::resolve(24, &[5, 5]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert_eq!(
            Shape::resolve(24, &[isize::MAX, 4]),
            Err(Error::ShapeMismatch {
                expected: vec![24],
                got: vec![usize::MAX],
            })
        );
        assert!(matches!(
            Shape::resolve(24, &[isize::MAX, 4, -1]),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
