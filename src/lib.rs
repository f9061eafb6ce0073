//! # tensile
//!
//! **Dense N-dimensional tensors with axis reductions and layout transforms.**
//!
//! A [`Tensor`](tensor::Tensor) is a strided view (shape, strides, offset) over a
//! reference-counted, typed storage buffer. Views created by `reshape` or a flip
//! share that buffer; copying operations allocate a new one.
//!
//! ## Features
//!
//! - **Construction**: `arange`, zero/one-filled tensors, tensors from slices or raw bytes
//! - **Layout**: reshape with a `-1` placeholder, strict views, flips by negative strides
//! - **Reductions**: minimum, maximum and p-norms over any axis subset, with `keepdim`
//!   and optional caller-supplied outputs
//! - **Multiple dtypes**: f64, f32, f16, bf16, signed and unsigned integers
//!
//! ## Quick Start
//!
//! ```rust
//! use tensile::prelude::*;
//!
//! let a = tensile::arange(24, DType::F32)?.reshape(&[2, 3, 4])?;
//!
//! // Euclidean norm over the first two axes
//! let n = a.norm2([0, 1], false)?;
//! assert_eq!(n.shape(), &[4]);
//!
//! // Reverse the last axis in place, then take the minimum over axis 0
//! a.fliplr(true)?;
//! let m = a.minimum(0, false)?;
//! assert_eq!(m.get(&[0, 0])?, 3.0);
//!
//! // Write a 3-norm into a half-precision output
//! let out = tensile::tensor(&[4], DType::F16)?;
//! tensile::ops::norm_into(&a, 3.0, [0, 1], false, &out)?;
//! println!("{out}");
//! # Ok::<(), tensile::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): evaluate independent reduction outputs on the rayon pool

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod tensor;

use dtype::DType;
use error::Result;
use tensor::Tensor;

/// Rank-1 tensor holding `0, 1, ..., count - 1` converted to `dtype`
///
/// Shorthand for [`Tensor::arange`].
///
/// # Errors
///
/// `OutOfMemory` if the buffer cannot be allocated.
pub fn arange(count: usize, dtype: DType) -> Result<Tensor> {
    Tensor::arange(count, dtype)
}

/// Zero-filled contiguous tensor of the given shape
///
/// Shorthand for [`Tensor::try_zeros`].
///
/// # Errors
///
/// `OutOfMemory` if the buffer cannot be allocated.
pub fn tensor(shape: &[usize], dtype: DType) -> Result<Tensor> {
    Tensor::try_zeros(shape, dtype)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{AccumulationPrecision, DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{Axes, NormOrder};
    pub use crate::tensor::{Layout, Tensor};
}
