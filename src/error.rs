//! Error types for tensile

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using tensile's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tensile operations
///
/// Every error is reported by the operation that triggered it and leaves
/// existing tensors and their storage untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Axis outside `[-ndim, ndim)`
    #[error("Axis {axis} out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange {
        /// The axis as given by the caller
        axis: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Min/max reduction over a dimension of size zero
    #[error("Cannot compute '{op}' over axis {axis} of size 0")]
    EmptyReduction {
        /// The reduction name
        op: &'static str,
        /// The empty axis (normalized)
        axis: usize,
    },

    /// Tensor rank too small for the operation
    #[error("Operation '{op}' requires rank >= {min_rank}, got rank {ndim}")]
    RankError {
        /// The operation name
        op: &'static str,
        /// Minimum rank the operation accepts
        min_rank: usize,
        /// Rank of the offending tensor
        ndim: usize,
    },

    /// Conversion between two element types is not allowed
    #[error("Cannot cast {from} to {to}")]
    UnsupportedCast {
        /// Source dtype
        from: DType,
        /// Target dtype
        to: DType,
    },

    /// DType mismatch between a typed access and the stored elements
    #[error("DType mismatch: expected {expected}, got {got}")]
    DTypeMismatch {
        /// DType the caller asked for
        expected: DType,
        /// DType actually stored
        got: DType,
    },

    /// Index out of range
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Length of the indexed dimension or buffer
        len: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a rank error for operations that need at least one dimension
    pub fn rank(op: &'static str, min_rank: usize, ndim: usize) -> Self {
        Self::RankError { op, min_rank, ndim }
    }
}
