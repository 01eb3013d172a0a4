//! Error types.
//!
//! Three layers:
//!
//! - [`FitError`]: failures reported by the fit collaborator (optimizers, error
//!   estimators, parameter limits)
//! - [`StatError`]: a residual display asked for per-point errors the active
//!   statistic cannot provide
//! - [`ConfidenceError`]: everything a confidence scan can fail with, including
//!   a wrapped [`FitError`] raised mid-scan

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = ConfidenceError> = std::result::Result<T, E>;

/// Failures of the fit / model / statistic subsystem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("parameter '{name}' value {val} is outside its limits [{min}, {max}]")]
    OutOfLimits {
        name: String,
        val: f64,
        min: f64,
        max: f64,
    },

    #[error("thawed parameter vector has length {got}, expected {expected}")]
    ThawedLength { expected: usize, got: usize },

    #[error("statistic evaluated to a non-finite value ({value})")]
    NonFiniteStat { value: f64 },

    #[error("{method} did not converge after {nfev} function evaluations")]
    NonConvergence { method: &'static str, nfev: usize },

    #[error("curvature matrix is singular; cannot estimate errors")]
    SingularCurvature,

    #[error("{method} cannot be used with the {stat} statistic")]
    UnsupportedMethod {
        method: &'static str,
        stat: &'static str,
    },

    #[error("model has no thawed parameters")]
    NoThawedParameters,

    #[error("dataset is empty")]
    EmptyData,

    #[error("dataset arrays have mismatched lengths: {message}")]
    DataShape { message: String },
}

/// A display needs per-point errors the statistic does not supply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatError {
    #[error("{display} is not available with the {stat} statistic (no per-point errors)")]
    BadStat {
        display: &'static str,
        stat: &'static str,
    },
}

/// Errors raised by confidence interval / region scans.
#[derive(Error, Debug)]
pub enum ConfidenceError {
    #[error("parameter '{par}' is frozen; cannot compute {context}")]
    FrozenParameter { par: String, context: &'static str },

    #[error("parameter '{par}' is not a thawed parameter of model '{model}'")]
    NotThawed { par: String, model: String },

    #[error("parameter limits are invalid on axis {axis}: min ({min}) must be less than max ({max})")]
    InvalidBounds { axis: usize, min: f64, max: f64 },

    #[error("parameter limits must be {expected}")]
    NonScalarBounds { expected: &'static str },

    #[error("nloop parameter must be {expected}")]
    InsufficientSteps { expected: &'static str },

    #[error("step size on axis {axis} must be positive, finite and coarse enough for the axis range, got {delv}")]
    InvalidSpacing { axis: usize, delv: f64 },

    #[error("fac must be positive and finite, got {fac}")]
    InvalidFactor { fac: f64 },

    #[error("log scale on axis {axis} requires positive boundaries, got [{min}, {max}]")]
    LogScaleDomain { axis: usize, min: f64, max: f64 },

    #[error("the {stat} statistic cannot be used for {context}")]
    UnsupportedStatistic {
        stat: &'static str,
        context: &'static str,
    },

    #[error("sigma bounds must be a non-empty list: {reason}")]
    SigmaSpec { reason: &'static str },

    #[error("error estimate did not report parameter '{par}'")]
    MissingEstimate { par: String },

    #[error("fit error: {0}")]
    Fit(#[from] FitError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid scan configuration: {0}")]
    Config(#[from] serde_json::Error),
}
