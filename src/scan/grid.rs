//! Grid construction for one- and two-parameter scans.
//!
//! A grid is built once per scan and never changes afterwards. Its flattened
//! order is the order of the scan result:
//!
//! - 1-D: the axis values in increasing order
//! - 2-D: a mesh with axis 0 varying fastest, i.e. point `k` is
//!   `(x0[k % n0], x1[k / n0])`
//!
//! Log axes are generated evenly in `log10` space, so they are geometric in
//! linear space. Points are mapped back to linear values only when they are
//! handed to the fit.

use tracing::debug;

use crate::domain::EstMethod;
use crate::error::{ConfidenceError, Result};
use crate::fit::Fit;
use crate::math::{arange_inclusive, arange_len, linspace};

/// Upper limit on the points of a single axis built from a step size.
pub const MAX_AXIS_POINTS: usize = 1_000_000;

/// How points are laid out between the bounds of an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steps {
    /// Exactly this many evenly spaced points, endpoints included.
    Count(usize),
    /// Points `delv` apart from `min` up to `max` inclusive.
    Spacing(f64),
}

/// Everything needed to lay out an `N`-axis grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRequest<const N: usize> {
    /// Lower bounds; `None` derives them from a covariance estimate.
    pub min: Option<[f64; N]>,
    pub max: Option<[f64; N]>,
    pub steps: [Steps; N],
    /// Widening factor applied to derived bounds.
    pub fac: f64,
    pub log: [bool; N],
}

/// One grid axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Linear lower bound after clipping to the parameter limits.
    pub min: f64,
    /// Linear upper bound after clipping to the parameter limits.
    pub max: f64,
    pub log: bool,
    /// Grid coordinates, in `log10` space when `log` is set.
    pub values: Vec<f64>,
}

impl Axis {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Linear parameter value for a grid coordinate on this axis.
    ///
    /// Log coordinates are exponentiated and pinned into `[min, max]`, so
    /// rounding in `10^log10(v)` can never step outside the parameter limits.
    pub fn to_linear(&self, v: f64) -> f64 {
        if self.log {
            10f64.powf(v).max(self.min).min(self.max)
        } else {
            v
        }
    }

    /// Linear values of every coordinate on this axis.
    pub fn linear_values(&self) -> Vec<f64> {
        self.values.iter().map(|&v| self.to_linear(v)).collect()
    }
}

/// An immutable evaluation grid over `N` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<const N: usize> {
    pub axes: [Axis; N],
}

impl<const N: usize> Grid<N> {
    /// Number of points in the flattened grid.
    pub fn len(&self) -> usize {
        self.axes.iter().map(Axis::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid coordinates of the flattened point `idx`.
    pub fn point(&self, idx: usize) -> [f64; N] {
        let mut rest = idx;
        std::array::from_fn(|a| {
            let n = self.axes[a].len();
            let v = self.axes[a].values[rest % n];
            rest /= n;
            v
        })
    }

    /// All grid coordinates, in result order.
    pub fn points(&self) -> Vec<[f64; N]> {
        (0..self.len()).map(|i| self.point(i)).collect()
    }

    /// Linear parameter values for a grid point.
    pub fn to_linear(&self, point: [f64; N]) -> [f64; N] {
        std::array::from_fn(|a| self.axes[a].to_linear(point[a]))
    }

    /// Linear parameter values of every point, one vector per axis, in
    /// result order.
    pub fn linear_columns(&self) -> [Vec<f64>; N] {
        let points = self.points();
        std::array::from_fn(|a| {
            points
                .iter()
                .map(|p| self.axes[a].to_linear(p[a]))
                .collect()
        })
    }
}

/// Build the grid for the parameters at `idx`.
///
/// Validation happens before any point is generated. The fit's estimator is
/// swapped to covariance only while unset bounds are being derived, and is
/// restored whether or not the estimate succeeds.
pub fn build_grid<F: Fit, const N: usize>(
    fit: &mut F,
    idx: [usize; N],
    req: &GridRequest<N>,
) -> Result<Grid<N>> {
    for (axis, steps) in req.steps.iter().enumerate() {
        match *steps {
            Steps::Count(n) if n <= 1 => {
                return Err(ConfidenceError::InsufficientSteps {
                    expected: if N == 1 { "> 1" } else { "a list with elements > 1" },
                });
            }
            Steps::Spacing(delv) if !(delv.is_finite() && delv > 0.0) => {
                return Err(ConfidenceError::InvalidSpacing { axis, delv });
            }
            _ => {}
        }
    }

    let (mut min, mut max) = match (req.min, req.max) {
        (Some(min), Some(max)) => (min, max),
        (min, max) => {
            if !(req.fac.is_finite() && req.fac > 0.0) {
                return Err(ConfidenceError::InvalidFactor { fac: req.fac });
            }
            derive_bounds(fit, idx, min, max, req.fac)?
        }
    };

    let axes: Vec<Axis> = (0..N)
        .map(|a| {
            let invalid = |min: f64, max: f64| ConfidenceError::InvalidBounds { axis: a, min, max };
            // NaN fails here; clipping below would replace it with a hard limit.
            if !(min[a] < max[a]) {
                return Err(invalid(min[a], max[a]));
            }
            let par = &fit.pars()[idx[a]];
            min[a] = min[a].max(par.min);
            max[a] = max[a].min(par.max);
            if !(min[a] < max[a]) {
                return Err(invalid(min[a], max[a]));
            }
            if let Steps::Spacing(delv) = req.steps[a] {
                if !(arange_len(min[a], max[a], delv) <= MAX_AXIS_POINTS as f64) {
                    return Err(ConfidenceError::InvalidSpacing { axis: a, delv });
                }
            }
            if req.log[a] && !(min[a] > 0.0 && max[a] > 0.0) {
                return Err(ConfidenceError::LogScaleDomain {
                    axis: a,
                    min: min[a],
                    max: max[a],
                });
            }
            Ok(make_axis(min[a], max[a], req.steps[a], req.log[a]))
        })
        .collect::<Result<_>>()?;

    let axes: [Axis; N] = axes
        .try_into()
        .map_err(|_| ConfidenceError::NonScalarBounds { expected: "one entry per axis" })?;
    let grid = Grid { axes };
    debug!(points = grid.len(), ?min, ?max, "built scan grid");
    Ok(grid)
}

fn make_axis(min: f64, max: f64, steps: Steps, log: bool) -> Axis {
    let linear = match steps {
        Steps::Count(n) => linspace(min, max, n),
        Steps::Spacing(delv) => arange_inclusive(min, max, delv),
    };
    let values = if log {
        linspace(min.log10(), max.log10(), linear.len())
    } else {
        linear
    };
    Axis { min, max, log, values }
}

/// Bounds from a covariance estimate around the current values.
///
/// Each unset side becomes `val + bound`, or the hard limit when the estimate
/// has no usable bound. The interval is then re-centred and widened by `fac`
/// on each side.
fn derive_bounds<F: Fit, const N: usize>(
    fit: &mut F,
    idx: [usize; N],
    user_min: Option<[f64; N]>,
    user_max: Option<[f64; N]>,
    fac: f64,
) -> Result<([f64; N], [f64; N])> {
    let old = fit.estmethod();
    fit.set_estmethod(EstMethod::Covariance);
    let estimate = fit.est_errors();
    fit.set_estmethod(old);
    let estimate = estimate?;

    let mut min = [0.0; N];
    let mut max = [0.0; N];
    for a in 0..N {
        let par = &fit.pars()[idx[a]];
        let pos = estimate
            .index_of(&par.fullname)
            .ok_or_else(|| ConfidenceError::MissingEstimate {
                par: par.fullname.clone(),
            })?;
        let usable = |b: Option<f64>| b.filter(|v| !v.is_nan());

        min[a] = match user_min {
            Some(m) => m[a],
            None => usable(estimate.parmins[pos]).map_or(par.min, |b| par.val + b),
        };
        max[a] = match user_max {
            Some(m) => m[a],
            None => usable(estimate.parmaxes[pos]).map_or(par.max, |b| par.val + b),
        };

        let mid = 0.5 * (max[a] + min[a]);
        let half = (mid - min[a]).abs();
        min[a] = mid - fac * half;
        max[a] = mid + fac * half;
    }
    debug!(?min, ?max, fac, "derived scan bounds from covariance estimate");
    Ok((min, max))
}
