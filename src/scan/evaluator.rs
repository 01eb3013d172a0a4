//! Statistic at a single grid point.

use crate::error::FitError;
use crate::fit::{Fit, FitOptions};
use crate::scan::{Grid, ScanMode};

/// Maps a grid point to a statistic value on a prepared fit.
///
/// The fit passed to [`Evaluator::eval`] must already be in scanning state
/// (targets frozen, and in uncertainty mode everything else frozen too).
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'g, const N: usize> {
    grid: &'g Grid<N>,
    targets: [usize; N],
    refit: bool,
}

impl<'g, const N: usize> Evaluator<'g, N> {
    /// `thawed_before` is the number of thawed parameters before the scan
    /// froze anything. A projection re-fits only when some parameter other
    /// than the targets was free.
    pub fn new(grid: &'g Grid<N>, targets: [usize; N], mode: ScanMode, thawed_before: usize) -> Self {
        Self {
            grid,
            targets,
            refit: mode == ScanMode::Projection && thawed_before > N,
        }
    }

    pub fn refits(&self) -> bool {
        self.refit
    }

    /// Set the targets to the linear values of `point` and return the
    /// statistic there, re-fitting the free parameters in projection mode.
    pub fn eval<F: Fit>(&self, fit: &mut F, point: [f64; N]) -> Result<f64, FitError> {
        let linear = self.grid.to_linear(point);
        for (&idx, &val) in self.targets.iter().zip(&linear) {
            fit.pars_mut()[idx].set_val(val)?;
        }
        if self.refit {
            Ok(fit.fit(FitOptions::reusing_setup())?.statval)
        } else {
            fit.calc_stat()
        }
    }
}
