//! Tensor operations
//!
//! Free functions over [`Tensor`](crate::tensor::Tensor); the same operations
//! are available as methods on the tensor itself.
//!
//! ```text
//! ops
//!   ├── cast        dtype conversion, strided copies
//!   ├── reduce      minimum, maximum, norm, norm2 (+ *_into variants)
//!   └── transform   flip, flip_in_place, fliplr, flipud
//! ```
//!
//! Every operation dispatches once on the runtime [`DType`](crate::dtype::DType)
//! and then runs a kernel generic over the concrete element type.

pub mod cast;
mod kernels;
pub mod reduce;
pub mod transform;

pub use cast::cast;
pub use kernels::NormOrder;
pub use reduce::{
    Axes, ReduceOp, maximum, maximum_into, minimum, minimum_into, norm, norm_into, norm_with_precision,
    norm2, norm2_into, normalize_axes, reduce_output_shape,
};
pub use transform::{flip, flip_in_place, fliplr, flipud};
