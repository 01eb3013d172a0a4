//! Shared domain types.
//!
//! These are the pieces of the fitting framework the scan engine touches:
//! parameters (value, hard limits, frozen flag), the identifiers of the
//! optimization method and error estimator, and the records returned by a fit
//! and by an error estimate.

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// A single model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Fully qualified name, e.g. `gauss.fwhm`.
    pub fullname: String,
    pub val: f64,
    /// Hard lower limit.
    pub min: f64,
    /// Hard upper limit.
    pub max: f64,
    pub frozen: bool,
}

impl Parameter {
    /// A thawed parameter with the given limits.
    pub fn new(fullname: impl Into<String>, val: f64, min: f64, max: f64) -> Self {
        Self {
            fullname: fullname.into(),
            val,
            min,
            max,
            frozen: false,
        }
    }

    /// Unbounded thawed parameter.
    pub fn unbounded(fullname: impl Into<String>, val: f64) -> Self {
        Self::new(fullname, val, f64::MIN, f64::MAX)
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Set the value, rejecting anything outside the hard limits.
    pub fn set_val(&mut self, val: f64) -> Result<(), FitError> {
        if !(val >= self.min && val <= self.max) {
            return Err(FitError::OutOfLimits {
                name: self.fullname.clone(),
                val,
                min: self.min,
                max: self.max,
            });
        }
        self.val = val;
        Ok(())
    }

    /// Clamp a candidate value into `[min, max]`.
    pub fn clamp(&self, val: f64) -> f64 {
        val.max(self.min).min(self.max)
    }
}

/// Optimization method used by `Fit::fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptMethod {
    /// Levenberg-Marquardt.
    LevMar,
    /// Nelder-Mead simplex.
    NelderMead,
    /// Monte-Carlo restarts of the simplex.
    MonCar,
}

impl OptMethod {
    pub fn name(self) -> &'static str {
        match self {
            OptMethod::LevMar => "levmar",
            OptMethod::NelderMead => "neldermead",
            OptMethod::MonCar => "moncar",
        }
    }

    /// Whether the method is trusted for confidence-limit work.
    pub fn suits_confidence(self) -> bool {
        matches!(self, OptMethod::LevMar | OptMethod::NelderMead)
    }
}

/// Error estimation method used by `Fit::est_errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstMethod {
    /// Inverse curvature matrix at the best fit.
    Covariance,
    /// Profile search for `Δstat = 1` with the other parameters re-fitted.
    Confidence,
}

impl EstMethod {
    pub fn name(self) -> &'static str {
        match self {
            EstMethod::Covariance => "covariance",
            EstMethod::Confidence => "confidence",
        }
    }
}

/// Outcome of a single `Fit::fit` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Statistic value at the optimum.
    pub statval: f64,
    /// Thawed parameter values at the optimum.
    pub parvals: Vec<f64>,
    /// Number of statistic evaluations.
    pub nfev: usize,
    pub method: OptMethod,
}

/// Outcome of `Fit::est_errors`.
///
/// Bounds are offsets from the best-fit value (`parmins` negative, `parmaxes`
/// positive). `None` means the estimator could not determine that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimate {
    pub method: EstMethod,
    pub parnames: Vec<String>,
    pub parvals: Vec<f64>,
    pub parmins: Vec<Option<f64>>,
    pub parmaxes: Vec<Option<f64>>,
}

impl ErrorEstimate {
    /// Position of `name` in the estimate.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.parnames.iter().position(|n| n == name)
    }
}

/// A per-axis option that may be given as a scalar or as a list.
///
/// Interval (1-D) scans expect scalars, region (2-D) scans expect lists of
/// length two. Keeping both shapes representable lets the scan report a
/// precise error for the wrong one instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Copy> AxisValue<T> {
    /// The scalar form, if this is one.
    pub fn scalar(&self) -> Option<T> {
        match self {
            AxisValue::One(v) => Some(*v),
            AxisValue::Many(_) => None,
        }
    }

    /// Exactly `N` list entries, if this is such a list.
    pub fn array<const N: usize>(&self) -> Option<[T; N]> {
        match self {
            AxisValue::One(_) => None,
            AxisValue::Many(values) => <[T; N]>::try_from(values.as_slice()).ok(),
        }
    }
}

impl<T> From<T> for AxisValue<T> {
    fn from(value: T) -> Self {
        AxisValue::One(value)
    }
}

impl<T> AxisValue<T> {
    /// Two-entry list, the shape region scans expect.
    pub fn pair(first: T, second: T) -> Self {
        AxisValue::Many(vec![first, second])
    }

    /// The list form, if this is one.
    pub fn as_list(&self) -> Option<&[T]> {
        match self {
            AxisValue::One(_) => None,
            AxisValue::Many(values) => Some(values),
        }
    }
}
