//! Reduction kernels over strided lanes
//!
//! A reduction is described by two offset lists: `bases`, the storage offset
//! of the first element reduced into each output position, and `lane`, the
//! offsets of the reduced elements relative to that base. Each output
//! position is folded sequentially, so results do not depend on whether the
//! positions are evaluated in parallel.

use crate::dtype::Element;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Minimum number of input elements before output positions are spread over
/// the rayon pool
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 1 << 15;

/// Iterator over the elements of one output position
pub(crate) struct Lane<'a, T> {
    data: &'a [T],
    base: isize,
    offsets: std::slice::Iter<'a, isize>,
}

impl<'a, T: Element> Lane<'a, T> {
    fn new(data: &'a [T], base: usize, lane: &'a [isize]) -> Self {
        Self {
            data,
            base: base as isize,
            offsets: lane.iter(),
        }
    }
}

impl<T: Element> Iterator for Lane<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.offsets
            .next()
            .map(|&o| self.data[(self.base + o) as usize])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

/// Apply `f` to every lane, one result per base offset
pub(crate) fn map_lanes<T, O, F>(data: &[T], bases: &[usize], lane: &[isize], f: F) -> Vec<O>
where
    T: Element,
    O: Send,
    F: Fn(Lane<'_, T>) -> O + Sync + Send,
{
    #[cfg(feature = "rayon")]
    if bases.len() > 1 && bases.len().saturating_mul(lane.len()) >= PARALLEL_THRESHOLD {
        return bases
            .par_iter()
            .map(|&base| f(Lane::new(data, base, lane)))
            .collect();
    }

    bases
        .iter()
        .map(|&base| f(Lane::new(data, base, lane)))
        .collect()
}

// ============================================================================
// Min / Max
// ============================================================================

#[inline]
fn pick_min<T: Element>(a: T, b: T) -> T {
    if a.is_nan() || (!b.is_nan() && a <= b) {
        a
    } else {
        b
    }
}

#[inline]
fn pick_max<T: Element>(a: T, b: T) -> T {
    if a.is_nan() || (!b.is_nan() && a >= b) {
        a
    } else {
        b
    }
}

/// Smallest element of a non-empty lane; NaN wins
pub(crate) fn min_lane<T: Element>(lane: Lane<'_, T>) -> T {
    lane.reduce(pick_min).unwrap_or_else(T::zero)
}

/// Largest element of a non-empty lane; NaN wins
pub(crate) fn max_lane<T: Element>(lane: Lane<'_, T>) -> T {
    lane.reduce(pick_max).unwrap_or_else(T::zero)
}

// ============================================================================
// Norms
// ============================================================================

/// Order of a vector norm
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NormOrder {
    /// Sum of magnitudes
    L1,
    /// Euclidean norm: square root of the sum of squares
    L2,
    /// Largest magnitude
    Inf,
    /// General `(Σ|x|^p)^(1/p)`
    P(f64),
}

impl NormOrder {
    /// Classify `p`; callers have already rejected non-positive and NaN values
    pub(crate) fn from_p(p: f64) -> Self {
        if p == 1.0 {
            Self::L1
        } else if p == 2.0 {
            Self::L2
        } else if p == f64::INFINITY {
            Self::Inf
        } else {
            Self::P(p)
        }
    }
}

/// Accumulator type for norm reductions
///
/// Elements are widened through f64, combined in `Self`, and the final value is
/// widened back to f64 before the output cast.
pub(crate) trait Accumulator: Copy + Send + Sync + Into<f64> {
    const ZERO: Self;
    /// Convert f64 input to accumulator type
    fn acc_in(v: f64) -> Self;
    fn acc_add(self, other: Self) -> Self;
    fn acc_mul(self, other: Self) -> Self;
    fn acc_max(self, other: Self) -> Self;
    fn acc_powf(self, p: Self) -> Self;
    fn acc_sqrt(self) -> Self;
}

macro_rules! impl_accumulator {
    ($ty:ty) => {
        impl Accumulator for $ty {
            const ZERO: Self = 0.0;

            #[inline]
            fn acc_in(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn acc_add(self, other: Self) -> Self {
                self + other
            }

            #[inline]
            fn acc_mul(self, other: Self) -> Self {
                self * other
            }

            #[inline]
            fn acc_max(self, other: Self) -> Self {
                if self.is_nan() || other <= self {
                    self
                } else {
                    other
                }
            }

            #[inline]
            fn acc_powf(self, p: Self) -> Self {
                self.powf(p)
            }

            #[inline]
            fn acc_sqrt(self) -> Self {
                self.sqrt()
            }
        }
    };
}

impl_accumulator!(f32);
impl_accumulator!(f64);

/// Norm of one lane, accumulated in `A`
pub(crate) fn norm_lane<T: Element, A: Accumulator>(lane: Lane<'_, T>, order: NormOrder) -> f64 {
    let magnitudes = lane.map(|v| A::acc_in(v.to_f64().abs()));
    match order {
        NormOrder::L1 => magnitudes.fold(A::ZERO, A::acc_add).into(),
        NormOrder::L2 => magnitudes
            .fold(A::ZERO, |acc, m| acc.acc_add(m.acc_mul(m)))
            .acc_sqrt()
            .into(),
        NormOrder::Inf => magnitudes.fold(A::ZERO, A::acc_max).into(),
        NormOrder::P(p) => {
            let exponent = A::acc_in(p);
            magnitudes
                .fold(A::ZERO, |acc, m| acc.acc_add(m.acc_powf(exponent)))
                .acc_powf(A::acc_in(p.recip()))
                .into()
        }
    }
}
