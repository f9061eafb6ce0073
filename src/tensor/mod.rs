//! Tensor types: layout, storage, and the `Tensor` itself

mod core;
mod display;
mod layout;
mod shape;
pub(crate) mod storage;
mod strides;

pub use self::core::Tensor;
pub(crate) use layout::strided_offsets;
pub use layout::Layout;
pub(crate) use shape::checked_product;
pub use shape::{INFER_DIM, Shape};
pub use storage::{Buffer, Storage};
pub use strides::Strides;
