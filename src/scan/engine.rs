//! Machinery shared by the interval and region scans.
//!
//! A scan runs in two phases:
//!
//! - [`prepare`]: every check and every piece of read-only setup (targets,
//!   best-fit statistic, grid, optimizer choice). Nothing here leaves the fit
//!   changed, so any error it returns is seen before mutation.
//! - [`execute`]: acquire the guard, evaluate the grid in parallel, release.

use std::time::Instant;

use tracing::info;

use crate::domain::{Diagnostics, OptMethod};
use crate::error::{ConfidenceError, Result};
use crate::fit::Fit;
use crate::scan::{
    build_grid, run_scan, select_method, Evaluator, FrozenStateGuard, Grid, GridRequest, ScanMode,
};

/// A validated scan, ready to run.
#[derive(Debug, Clone)]
pub(crate) struct Prepared<const N: usize> {
    pub mode: ScanMode,
    pub context: &'static str,
    pub targets: [usize; N],
    pub labels: [String; N],
    /// Statistic at the best fit.
    pub stat: f64,
    /// Best-fit values of the targets.
    pub parvals: [f64; N],
    pub grid: Grid<N>,
    pub method: Option<OptMethod>,
    pub diagnostics: Diagnostics,
}

/// Index of each named target, checked to be a thawed parameter.
pub(crate) fn resolve_targets<F: Fit, const N: usize>(
    fit: &F,
    names: [&str; N],
    context: &'static str,
) -> Result<[usize; N]> {
    let mut idx = [0; N];
    for (slot, name) in idx.iter_mut().zip(names) {
        let i = fit.par_index(name).ok_or_else(|| ConfidenceError::NotThawed {
            par: name.to_string(),
            model: fit.model_name().to_string(),
        })?;
        if fit.pars()[i].frozen {
            return Err(ConfidenceError::FrozenParameter {
                par: name.to_string(),
                context,
            });
        }
        *slot = i;
    }
    Ok(idx)
}

pub(crate) fn prepare<F: Fit, const N: usize>(
    fit: &mut F,
    names: [&str; N],
    mode: ScanMode,
    context: &'static str,
    req: &GridRequest<N>,
    fast: bool,
) -> Result<Prepared<N>> {
    if !fit.stat().supports_confidence() {
        return Err(ConfidenceError::UnsupportedStatistic {
            stat: fit.stat().name(),
            context,
        });
    }
    let targets = resolve_targets(fit, names, context)?;
    let stat = fit.calc_stat()?;
    let parvals = targets.map(|i| fit.pars()[i].val);
    let labels = targets.map(|i| fit.pars()[i].fullname.clone());

    let grid = build_grid(fit, targets, req)?;

    let mut diagnostics = Diagnostics::new();
    let method = match mode {
        ScanMode::Projection => select_method(
            fit.method(),
            fit.stat(),
            fast,
            &format!("{context} plot"),
            &mut diagnostics,
        ),
        ScanMode::Uncertainty => None,
    };

    Ok(Prepared {
        mode,
        context,
        targets,
        labels,
        stat,
        parvals,
        grid,
        method,
        diagnostics,
    })
}

/// Evaluate the prepared grid; the fit is restored before this returns.
pub(crate) fn execute<F: Fit, const N: usize>(
    fit: &mut F,
    plan: &Prepared<N>,
    numcores: Option<usize>,
) -> Result<Vec<f64>> {
    let started = Instant::now();
    let points = plan.grid.points();
    info!(
        scan = plan.context,
        points = points.len(),
        numcores = ?numcores,
        "starting confidence scan"
    );

    let evaluator = Evaluator::new(&plan.grid, plan.targets, plan.mode, fit.thawed_count());
    let y = {
        let guard = FrozenStateGuard::acquire(fit, plan.mode, &plan.targets, plan.method);
        run_scan(&*guard, &evaluator, &points, numcores)?
    };

    info!(
        scan = plan.context,
        points = y.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "confidence scan finished"
    );
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Steps;
    use crate::stats::LeastSq;
    use crate::test_utils::QuadraticFit;

    fn req() -> GridRequest<1> {
        GridRequest {
            min: Some([0.0]),
            max: Some([2.0]),
            steps: [Steps::Count(3)],
            fac: 1.0,
            log: [false],
        }
    }

    #[test]
    fn targets_must_exist_and_be_thawed() {
        let mut fit = QuadraticFit::new(&[("q.a", 1.0), ("q.b", 1.0)]);
        fit.pars[1].freeze();

        let err = resolve_targets(&fit, ["q.z"], "interval projection").unwrap_err();
        assert!(matches!(err, ConfidenceError::NotThawed { ref model, .. } if model == "quad"));

        let err = resolve_targets(&fit, ["q.a", "q.b"], "region uncertainty").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'q.b' is frozen; cannot compute region uncertainty"
        );
        assert_eq!(resolve_targets(&fit, ["q.a"], "x").unwrap(), [0]);
    }

    #[test]
    fn least_squares_is_rejected_before_anything_else() {
        let mut fit = QuadraticFit::new(&[("q.a", 1.0)]).with_stat(LeastSq);
        fit.pars[0].freeze();
        let err = prepare(&mut fit, ["q.a"], ScanMode::Projection, "interval projection", &req(), true)
            .unwrap_err();
        assert!(matches!(err, ConfidenceError::UnsupportedStatistic { stat: "leastsq", .. }));
    }

    #[test]
    fn prepare_does_not_touch_the_fit() {
        let mut fit = QuadraticFit::new(&[("q.a", 1.0), ("q.b", 3.0)]);
        fit.method = OptMethod::MonCar;
        let before = fit.pars.clone();
        let plan = prepare(&mut fit, ["q.b"], ScanMode::Projection, "interval projection", &req(), true)
            .unwrap();

        assert_eq!(fit.pars, before);
        assert_eq!(fit.method, OptMethod::MonCar);
        assert_eq!(plan.method, Some(OptMethod::LevMar));
        assert_eq!(plan.parvals, [3.0]);
        assert_eq!(plan.labels, ["q.b".to_string()]);
        assert_eq!(plan.diagnostics.len(), 2);
        assert_eq!(fit.lifecycle.startups, 0);
    }

    #[test]
    fn execute_restores_the_fit_after_a_failing_point() {
        let mut fit = QuadraticFit::new(&[("q.a", 1.0), ("q.b", 3.0)]);
        fit.fail_above = Some((0, 1.5));
        let before = fit.pars.clone();
        let plan = prepare(&mut fit, ["q.a"], ScanMode::Uncertainty, "interval uncertainty", &req(), true)
            .unwrap();

        let err = execute(&mut fit, &plan, Some(2)).unwrap_err();
        assert!(matches!(err, ConfidenceError::Fit(_)));
        assert_eq!(fit.pars, before);
        assert_eq!(fit.lifecycle.startups, 1);
        assert_eq!(fit.lifecycle.teardowns, 1);
    }
}
