//! Axis reductions: minimum, maximum and p-norms
//!
//! Every reduction takes an [`Axes`] selection and a `keepdim` flag. The output
//! shape is the input shape with the reduced axes removed, or set to 1 when
//! `keepdim` is true; the remaining axes keep their relative order.
//!
//! The `*_into` variants write into a caller-supplied tensor instead of
//! allocating one. The whole result is computed and validated before the
//! output is touched, so a failing call leaves it unchanged and the output may
//! even be a view of the input.

use super::cast::assign;
use super::kernels::{self, NormOrder, map_lanes};
use crate::dtype::{AccumulationPrecision, DType, Element, dispatch_dtype};
use crate::error::{Error, Result};
use crate::tensor::{Storage, Tensor, strided_offsets};
use smallvec::{SmallVec, smallvec};

/// Reduction operation kind
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ReduceOp {
    /// Minimum element
    Min,
    /// Maximum element
    Max,
    /// Vector norm of the given order
    Norm(NormOrder),
}

impl ReduceOp {
    /// Operation name used in errors and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Min => "minimum",
            Self::Max => "maximum",
            Self::Norm(NormOrder::L2) => "norm2",
            Self::Norm(_) => "norm",
        }
    }
}

// ============================================================================
// Axis selection
// ============================================================================

/// Axes participating in a reduction
///
/// Converts from a single axis, an array, a slice or a vector of axes, so
/// `a.minimum(0, false)` and `a.norm2([0, 1], false)` both work. Negative
/// axes count from the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Axes {
    /// Every axis of the input
    #[default]
    All,
    /// An explicit list; empty means "reduce nothing"
    List(SmallVec<[isize; 4]>),
}

impl Axes {
    /// Validate against a tensor of rank `ndim` and return sorted axis indices
    pub fn resolve(&self, ndim: usize) -> Result<SmallVec<[usize; 4]>> {
        match self {
            Self::All => Ok((0..ndim).collect()),
            Self::List(axes) => normalize_axes(ndim, axes),
        }
    }
}

macro_rules! impl_axes_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Axes {
                fn from(axis: $ty) -> Self {
                    Self::List(smallvec![isize::try_from(axis).unwrap_or(isize::MAX)])
                }
            }

            impl From<&[$ty]> for Axes {
                fn from(axes: &[$ty]) -> Self {
                    Self::List(
                        axes.iter()
                            .map(|&a| isize::try_from(a).unwrap_or(isize::MAX))
                            .collect(),
                    )
                }
            }

            impl<const N: usize> From<[$ty; N]> for Axes {
                fn from(axes: [$ty; N]) -> Self {
                    Self::from(&axes[..])
                }
            }

            impl<const N: usize> From<&[$ty; N]> for Axes {
                fn from(axes: &[$ty; N]) -> Self {
                    Self::from(&axes[..])
                }
            }

            impl From<Vec<$ty>> for Axes {
                fn from(axes: Vec<$ty>) -> Self {
                    Self::from(axes.as_slice())
                }
            }
        )*
    };
}

impl_axes_from!(isize, i32, usize);

/// Normalize reduction axes (handle negative indices)
///
/// Returns the axes sorted ascending.
///
/// # Errors
///
/// - `AxisOutOfRange` if an axis is outside `[-ndim, ndim)`
/// - `InvalidArgument` if an axis appears twice
pub fn normalize_axes(ndim: usize, axes: &[isize]) -> Result<SmallVec<[usize; 4]>> {
    let mut out: SmallVec<[usize; 4]> = SmallVec::with_capacity(axes.len());
    for &axis in axes {
        let idx = if axis < 0 { axis + ndim as isize } else { axis };
        if idx < 0 || idx >= ndim as isize {
            return Err(Error::AxisOutOfRange { axis, ndim });
        }
        let idx = idx as usize;
        if out.contains(&idx) {
            return Err(Error::invalid_argument(
                "axes",
                format!("axis {axis} appears more than once in {axes:?}"),
            ));
        }
        out.push(idx);
    }
    out.sort_unstable();
    Ok(out)
}

/// Compute output shape for reduction
///
/// # Arguments
/// * `input_shape` - Shape of input tensor
/// * `axes` - Normalized axes to reduce over
/// * `keepdim` - If true, keep reduced dimensions as size 1
pub fn reduce_output_shape(input_shape: &[usize], axes: &[usize], keepdim: bool) -> Vec<usize> {
    if keepdim {
        input_shape
            .iter()
            .enumerate()
            .map(|(i, &s)| if axes.contains(&i) { 1 } else { s })
            .collect()
    } else {
        input_shape
            .iter()
            .enumerate()
            .filter(|(i, _)| !axes.contains(i))
            .map(|(_, &s)| s)
            .collect()
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Validated axes and output shape of one reduction call
struct ReducePlan {
    op: ReduceOp,
    axes: SmallVec<[usize; 4]>,
    out_shape: Vec<usize>,
}

impl ReducePlan {
    fn new(op: ReduceOp, a: &Tensor, axes: &Axes, keepdim: bool) -> Result<Self> {
        let axes = axes.resolve(a.ndim())?;
        let out_shape = reduce_output_shape(a.shape(), &axes, keepdim);
        tracing::trace!(op = op.name(), input = ?a.shape(), ?axes, ?out_shape, "reduce");
        Ok(Self {
            op,
            axes,
            out_shape,
        })
    }

    /// Min and max have no identity element
    fn require_non_empty(&self, a: &Tensor) -> Result<()> {
        match self.axes.iter().find(|&&axis| a.shape()[axis] == 0) {
            Some(&axis) => Err(Error::EmptyReduction {
                op: self.op.name(),
                axis,
            }),
            None => Ok(()),
        }
    }

    fn check_output(&self, out: &Tensor) -> Result<()> {
        if out.shape() != self.out_shape.as_slice() {
            return Err(Error::shape_mismatch(&self.out_shape, out.shape()));
        }
        Ok(())
    }

    /// Storage offset of each output lane and the relative offsets within a lane
    ///
    /// Both lists are materialized: one `usize` per output position and one
    /// `isize` per element of a lane, never one per input element.
    fn lanes(&self, a: &Tensor) -> (Vec<usize>, Vec<isize>) {
        let mut kept: (SmallVec<[usize; 4]>, SmallVec<[isize; 4]>) =
            Default::default();
        let mut reduced = kept.clone();

        for (d, (&size, &stride)) in a.shape().iter().zip(a.strides()).enumerate() {
            let target = if self.axes.contains(&d) {
                &mut reduced
            } else {
                &mut kept
            };
            target.0.push(size);
            target.1.push(stride);
        }

        let bases = strided_offsets(&kept.0, &kept.1, a.offset() as isize)
            .into_iter()
            .map(|o| o as usize)
            .collect();
        let lane = strided_offsets(&reduced.0, &reduced.1, 0);
        (bases, lane)
    }
}

// ============================================================================
// Min / Max
// ============================================================================

fn extremum(plan: &ReducePlan, a: &Tensor) -> Result<Tensor> {
    let take_max = match plan.op {
        ReduceOp::Min => false,
        ReduceOp::Max => true,
        ReduceOp::Norm(_) => {
            return Err(Error::invalid_argument(
                "op",
                format!("{} is not an extremum", plan.op.name()),
            ));
        }
    };
    plan.require_non_empty(a)?;
    let (bases, lane) = plan.lanes(a);

    let storage = dispatch_dtype!(a.dtype(), T => {
        let values: Vec<T> = a.storage().with_slice::<T, _>(|data| {
            if take_max {
                map_lanes(data, &bases, &lane, kernels::max_lane)
            } else {
                map_lanes(data, &bases, &lane, kernels::min_lane)
            }
        })?;
        Storage::from_vec(values)
    });
    Ok(Tensor::from_contiguous(storage, &plan.out_shape))
}

fn extremum_into(op: ReduceOp, a: &Tensor, axes: Axes, keepdim: bool, out: &Tensor) -> Result<()> {
    let plan = ReducePlan::new(op, a, &axes, keepdim)?;
    plan.check_output(out)?;
    let values = extremum(&plan, a)?;
    assign(out, &values)
}

/// Minimum over `axes`
///
/// NaN propagates: a lane containing NaN reduces to NaN. The result has the
/// input's dtype.
///
/// # Errors
///
/// - `AxisOutOfRange` / `InvalidArgument` for bad axes
/// - `EmptyReduction` if a reduced axis has size 0
///
/// # Example
///
/// ```
/// use tensile::prelude::*;
///
/// let a = Tensor::from_slice(&[3.0f32, 1.0, 2.0, 5.0], &[2, 2]);
/// let m = tensile::ops::minimum(&a, 0, false)?;
/// assert_eq!(m.to_vec::<f32>(), vec![2.0, 1.0]);
/// # Ok::<(), tensile::error::Error>(())
/// ```
pub fn minimum(a: &Tensor, axes: impl Into<Axes>, keepdim: bool) -> Result<Tensor> {
    let plan = ReducePlan::new(ReduceOp::Min, a, &axes.into(), keepdim)?;
    extremum(&plan, a)
}

/// Minimum over `axes`, written into `out` (converted to `out`'s dtype)
///
/// # Errors
///
/// Those of [`minimum`], plus `ShapeMismatch` if `out` does not have the
/// reduced shape.
pub fn minimum_into(a: &Tensor, axes: impl Into<Axes>, keepdim: bool, out: &Tensor) -> Result<()> {
    extremum_into(ReduceOp::Min, a, axes.into(), keepdim, out)
}

/// Maximum over `axes`; the mirror image of [`minimum`]
pub fn maximum(a: &Tensor, axes: impl Into<Axes>, keepdim: bool) -> Result<Tensor> {
    let plan = ReducePlan::new(ReduceOp::Max, a, &axes.into(), keepdim)?;
    extremum(&plan, a)
}

/// Maximum over `axes`, written into `out`; see [`minimum_into`]
pub fn maximum_into(a: &Tensor, axes: impl Into<Axes>, keepdim: bool, out: &Tensor) -> Result<()> {
    extremum_into(ReduceOp::Max, a, axes.into(), keepdim, out)
}

// ============================================================================
// Norms
// ============================================================================

fn norm_order(p: f64) -> Result<NormOrder> {
    if p.is_nan() || p <= 0.0 {
        return Err(Error::invalid_argument(
            "p",
            format!("norm order must be positive, got {p}"),
        ));
    }
    Ok(NormOrder::from_p(p))
}

/// Dtype of a freshly allocated norm result
fn norm_dtype(input: DType) -> DType {
    if input.is_float() { input } else { DType::F64 }
}

fn check_precision(precision: AccumulationPrecision, out: DType) -> Result<()> {
    if !precision.covers(out) {
        return Err(Error::invalid_argument(
            "precision",
            format!("{precision:?} accumulation is narrower than {out} output"),
        ));
    }
    Ok(())
}

fn norm_values(
    plan: &ReducePlan,
    a: &Tensor,
    order: NormOrder,
    precision: AccumulationPrecision,
    out_dtype: DType,
) -> Result<Tensor> {
    let (bases, lane) = plan.lanes(a);

    let values: Vec<f64> = dispatch_dtype!(a.dtype(), T => {
        a.storage().with_slice::<T, _>(|data| match precision {
            AccumulationPrecision::F32 => {
                map_lanes(data, &bases, &lane, |l| kernels::norm_lane::<T, f32>(l, order))
            }
            AccumulationPrecision::F64 => {
                map_lanes(data, &bases, &lane, |l| kernels::norm_lane::<T, f64>(l, order))
            }
        })?
    });

    let storage = dispatch_dtype!(out_dtype, D => {
        Storage::from_vec(values.into_iter().map(D::from_f64).collect::<Vec<D>>())
    });
    Ok(Tensor::from_contiguous(storage, &plan.out_shape))
}

/// p-norm over `axes`: `(Σ|x|^p)^(1/p)` for each output position
///
/// `p = 1`, `p = 2` and `p = f64::INFINITY` (largest magnitude) use dedicated
/// kernels. Sums are accumulated in f64 and cast once to the output dtype,
/// which is the input dtype for floats and `F64` for integer inputs. Reducing
/// an axis of size 0 yields 0.
///
/// # Errors
///
/// - `InvalidArgument` if `p` is not positive (or NaN), or for bad axes
/// - `AxisOutOfRange` for axes outside the tensor's rank
pub fn norm(a: &Tensor, p: f64, axes: impl Into<Axes>, keepdim: bool) -> Result<Tensor> {
    norm_with_precision(a, p, axes, keepdim, AccumulationPrecision::default())
}

/// p-norm with an explicit accumulation precision
///
/// # Errors
///
/// Those of [`norm`], plus `InvalidArgument` if `precision` is narrower than
/// the output dtype.
pub fn norm_with_precision(
    a: &Tensor,
    p: f64,
    axes: impl Into<Axes>,
    keepdim: bool,
    precision: AccumulationPrecision,
) -> Result<Tensor> {
    let order = norm_order(p)?;
    let plan = ReducePlan::new(ReduceOp::Norm(order), a, &axes.into(), keepdim)?;
    let out_dtype = norm_dtype(a.dtype());
    check_precision(precision, out_dtype)?;
    norm_values(&plan, a, order, precision, out_dtype)
}

/// p-norm written into `out`
///
/// The accumulated values are rounded once, straight to `out`'s dtype (round
/// to nearest even for f16/bf16 outputs).
///
/// # Errors
///
/// Those of [`norm`], plus `ShapeMismatch` if `out` does not have the reduced
/// shape and `UnsupportedCast` if `out` has an integer dtype.
pub fn norm_into(
    a: &Tensor,
    p: f64,
    axes: impl Into<Axes>,
    keepdim: bool,
    out: &Tensor,
) -> Result<()> {
    let order = norm_order(p)?;
    let plan = ReducePlan::new(ReduceOp::Norm(order), a, &axes.into(), keepdim)?;
    plan.check_output(out)?;
    if !out.dtype().is_float() {
        return Err(Error::UnsupportedCast {
            from: norm_dtype(a.dtype()),
            to: out.dtype(),
        });
    }
    let values = norm_values(&plan, a, order, AccumulationPrecision::default(), out.dtype())?;
    assign(out, &values)
}

/// Euclidean norm over `axes`
///
/// Accumulates squares and takes one square root per output position; the
/// same kernel serves `norm(a, 2.0, ..)`.
pub fn norm2(a: &Tensor, axes: impl Into<Axes>, keepdim: bool) -> Result<Tensor> {
    norm(a, 2.0, axes, keepdim)
}

/// Euclidean norm written into `out`; see [`norm_into`]
pub fn norm2_into(a: &Tensor, axes: impl Into<Axes>, keepdim: bool, out: &Tensor) -> Result<()> {
    norm_into(a, 2.0, axes, keepdim, out)
}
