//! Scoped freeze/thaw of a fit around a scan.
//!
//! [`FrozenStateGuard::acquire`] snapshots the frozen flags, the thawed
//! parameter vector and the optimizer, then prepares the fit for scanning.
//! Dropping the guard puts all of it back, on success, on error and while
//! unwinding from a panic.
//!
//! Release order:
//!
//! 1. frozen flags
//! 2. model teardown
//! 3. thawed parameter vector
//! 4. optimization method

use std::ops::{Deref, DerefMut};

use tracing::{debug, error};

use crate::domain::OptMethod;
use crate::fit::Fit;

/// Which parameters a scan keeps free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Only the scanned parameters are frozen; the rest are re-fitted.
    Projection,
    /// Every thawed parameter is frozen; the statistic is evaluated directly.
    Uncertainty,
}

impl ScanMode {
    pub fn name(self) -> &'static str {
        match self {
            ScanMode::Projection => "projection",
            ScanMode::Uncertainty => "uncertainty",
        }
    }
}

/// Holds a fit in its scanning state until dropped.
pub struct FrozenStateGuard<'a, F: Fit> {
    fit: &'a mut F,
    frozen: Vec<bool>,
    thawed: Vec<f64>,
    method: OptMethod,
}

impl<'a, F: Fit> FrozenStateGuard<'a, F> {
    /// Freeze `targets` (projection) or every thawed parameter (uncertainty),
    /// optionally switch the optimizer, then run the model startup once.
    pub fn acquire(fit: &'a mut F, mode: ScanMode, targets: &[usize], method: Option<OptMethod>) -> Self {
        let frozen: Vec<bool> = fit.pars().iter().map(|p| p.frozen).collect();
        let thawed = fit.thawed_pars();
        let old_method = fit.method();

        if let Some(m) = method {
            fit.set_method(m);
        }
        match mode {
            ScanMode::Projection => {
                for &i in targets {
                    fit.pars_mut()[i].freeze();
                }
            }
            ScanMode::Uncertainty => {
                for par in fit.pars_mut() {
                    par.freeze();
                }
            }
        }
        fit.startup();
        debug!(mode = mode.name(), frozen = fit.pars().len() - fit.thawed_count(), "acquired scan state");

        Self {
            fit,
            frozen,
            thawed,
            method: old_method,
        }
    }
}

impl<F: Fit> Deref for FrozenStateGuard<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        &*self.fit
    }
}

impl<F: Fit> DerefMut for FrozenStateGuard<'_, F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut *self.fit
    }
}

impl<F: Fit> Drop for FrozenStateGuard<'_, F> {
    fn drop(&mut self) {
        for (par, &frozen) in self.fit.pars_mut().iter_mut().zip(&self.frozen) {
            par.frozen = frozen;
        }
        self.fit.teardown();
        if let Err(err) = self.fit.set_thawed_pars(&self.thawed) {
            error!(%err, "failed to restore thawed parameter values after scan");
        }
        self.fit.set_method(self.method);
        debug!("released scan state");
    }
}
