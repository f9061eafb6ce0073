//! Nested-bracket rendering of tensor contents

use super::{Tensor, checked_product};
use crate::dtype::dispatch_dtype;
use std::fmt;

impl fmt::Display for Tensor {
    /// Render elements as nested brackets following the shape, e.g.
    ///
    /// ```text
    /// [[0, 1, 2],
    ///  [3, 4, 5]]
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch_dtype!(self.dtype(), T => {
            let data = self.try_to_vec::<T>().map_err(|_| fmt::Error)?;
            write_nested(f, &data, self.shape(), 0)
        })
    }
}

fn write_nested<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    data: &[T],
    shape: &[usize],
    depth: usize,
) -> fmt::Result {
    let Some((&len, inner)) = shape.split_first() else {
        return match data.first() {
            Some(value) => write!(f, "{value}"),
            None => Ok(()),
        };
    };

    let chunk = checked_product(inner).unwrap_or(0);
    f.write_str("[")?;
    for i in 0..len {
        if i > 0 {
            if inner.is_empty() {
                f.write_str(", ")?;
            } else {
                write!(f, ",\n{:indent$}", "", indent = depth + 1)?;
            }
        }
        write_nested(f, &data[i * chunk..(i + 1) * chunk], inner, depth + 1)?;
    }
    f.write_str("]")
}
