//! `conf-scan` library crate.
//!
//! Confidence intervals and regions for fitted statistical models: scan one or
//! two parameters over a grid and record how the fit statistic responds,
//! either re-fitting the other free parameters at every point (projection) or
//! holding them at their best-fit values (uncertainty).
//!
//! Layout:
//!
//! - [`domain`]: parameters, method identifiers, fit records, diagnostics
//! - [`stats`]: the statistic capability trait and reference statistics
//! - [`fit`]: the `Fit` contract and the reference `DataFit`
//! - [`scan`]: grids, freeze/thaw guard, parallel driver, the four scans
//! - [`report`]: residual displays and text formatting
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod report;
pub mod scan;
pub mod stats;

#[cfg(test)]
mod test_utils;

pub use error::{ConfidenceError, FitError, Result, StatError};
pub use fit::{DataFit, Dataset, Fit, FitOptions, Model};
pub use scan::{
    IntervalOptions, IntervalProjection, IntervalResult, IntervalUncertainty, RegionOptions,
    RegionProjection, RegionResult, RegionUncertainty,
};
