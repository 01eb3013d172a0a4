//! The fit collaborator.
//!
//! Responsibilities:
//!
//! - define the narrow [`Fit`] contract the scan engine drives
//! - provide a reference implementation ([`DataFit`]) over an in-memory
//!   dataset, with Levenberg-Marquardt / simplex / Monte-Carlo optimizers and
//!   covariance / confidence error estimates
//!
//! Scans evaluate grid points on private clones of a prepared fit, so the
//! contract requires `Clone + Send + Sync` and clones should be cheap.

pub mod data;
pub mod estimate;
pub mod optimizer;

pub use data::*;
pub use estimate::*;
pub use optimizer::*;

use crate::domain::{ErrorEstimate, EstMethod, FitResult, OptMethod, Parameter};
use crate::error::FitError;
use crate::stats::Statistic;

/// Per-call options for [`Fit::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitOptions {
    /// Skip the model's own startup/teardown around this fit.
    ///
    /// Scans run `startup` once, re-fit many times with this set, then run
    /// `teardown` once.
    pub reuse_setup: bool,
}

impl FitOptions {
    pub fn reusing_setup() -> Self {
        Self { reuse_setup: true }
    }
}

/// A fitted model bundled with its data, statistic and optimizer.
pub trait Fit: Clone + Send + Sync {
    /// Name of the model, for error messages.
    fn model_name(&self) -> &str;

    /// All model parameters, in model order.
    fn pars(&self) -> &[Parameter];

    fn pars_mut(&mut self) -> &mut [Parameter];

    fn stat(&self) -> &dyn Statistic;

    fn method(&self) -> OptMethod;

    fn set_method(&mut self, method: OptMethod);

    fn estmethod(&self) -> EstMethod;

    fn set_estmethod(&mut self, method: EstMethod);

    /// Statistic at the current parameter values.
    fn calc_stat(&self) -> Result<f64, FitError>;

    /// Optimize the thawed parameters, leaving them at the optimum.
    fn fit(&mut self, opts: FitOptions) -> Result<FitResult, FitError>;

    /// Error bounds for every thawed parameter under the current estimator.
    fn est_errors(&mut self) -> Result<ErrorEstimate, FitError>;

    fn startup(&mut self);

    fn teardown(&mut self);

    /// Index of the parameter named `fullname`.
    fn par_index(&self, fullname: &str) -> Option<usize> {
        self.pars().iter().position(|p| p.fullname == fullname)
    }

    fn thawed_count(&self) -> usize {
        self.pars().iter().filter(|p| !p.frozen).count()
    }

    /// Values of the thawed parameters, in model order.
    fn thawed_pars(&self) -> Vec<f64> {
        self.pars()
            .iter()
            .filter(|p| !p.frozen)
            .map(|p| p.val)
            .collect()
    }

    /// Assign the thawed parameters from `vals`, in model order.
    fn set_thawed_pars(&mut self, vals: &[f64]) -> Result<(), FitError> {
        let expected = self.thawed_count();
        if vals.len() != expected {
            return Err(FitError::ThawedLength {
                expected,
                got: vals.len(),
            });
        }
        for (par, &v) in self.pars_mut().iter_mut().filter(|p| !p.frozen).zip(vals) {
            par.set_val(v)?;
        }
        Ok(())
    }
}
