//! Parameter error estimates for [`DataFit`].
//!
//! - covariance: `cov = 2 H⁻¹` from a central-difference Hessian of the
//!   statistic at the current values, reported as symmetric `±σ`
//! - confidence: for each thawed parameter, walk away from the best fit with
//!   that parameter frozen and the others re-fitted until the statistic has
//!   risen by one, then bisect the crossing
//!
//! Both work on the values the fit holds now and never move them.

use tracing::debug;

use crate::domain::{ErrorEstimate, EstMethod};
use crate::error::FitError;
use crate::fit::{DataFit, Fit};
use crate::math::{hessian, sigmas};

/// Statistic rise that defines a one-parameter 1σ confidence bound.
const DELTA_STAT: f64 = 1.0;

/// Maximum number of step doublings while bracketing a bound.
const MAX_EXPANSIONS: usize = 60;

const MAX_BISECTIONS: usize = 100;

fn thawed_names(fit: &DataFit) -> Vec<String> {
    fit.pars()
        .iter()
        .filter(|p| !p.frozen)
        .map(|p| p.fullname.clone())
        .collect()
}

/// Standard deviations of the thawed parameters, `NaN` where undefined.
fn thawed_sigmas(fit: &DataFit) -> Result<Vec<f64>, FitError> {
    let x0 = fit.thawed_pars();
    if x0.is_empty() {
        return Err(FitError::NoThawedParameters);
    }
    let err = fit.staterror_for_stat();
    let err = err.as_deref();

    let hess = hessian(&x0, |p| {
        let v = fit.stat_at(p, err);
        v.is_finite().then_some(v)
    });
    let Some(cov) = hess.and_then(|h| (h * 0.5).try_inverse()) else {
        debug!("curvature matrix is singular or not finite");
        return Ok(vec![f64::NAN; x0.len()]);
    };
    Ok(sigmas(&cov).iter().copied().collect())
}

pub(crate) fn covariance_errors(fit: &DataFit) -> Result<ErrorEstimate, FitError> {
    let sig = thawed_sigmas(fit)?;
    let side = |s: f64, sign: f64| s.is_finite().then_some(sign * s);
    Ok(ErrorEstimate {
        method: EstMethod::Covariance,
        parnames: thawed_names(fit),
        parvals: fit.thawed_pars(),
        parmins: sig.iter().map(|&s| side(s, -1.0)).collect(),
        parmaxes: sig.iter().map(|&s| side(s, 1.0)).collect(),
    })
}

pub(crate) fn confidence_errors(fit: &DataFit) -> Result<ErrorEstimate, FitError> {
    let best = fit.calc_stat()?;
    let target = best + DELTA_STAT;
    let guesses = thawed_sigmas(fit)?;

    let free: Vec<usize> = (0..fit.pars().len())
        .filter(|&i| !fit.pars()[i].frozen)
        .collect();

    let mut parmins = Vec::with_capacity(free.len());
    let mut parmaxes = Vec::with_capacity(free.len());
    for (&idx, &sigma) in free.iter().zip(&guesses) {
        let mut profile = Profile::new(fit, idx);
        let val = fit.pars()[idx].val;
        let step = if sigma.is_finite() && sigma > 0.0 {
            sigma
        } else {
            0.1 * val.abs().max(1.0)
        };
        parmins.push(profile.bound(-1.0, step, target)?);
        parmaxes.push(profile.bound(1.0, step, target)?);
    }

    Ok(ErrorEstimate {
        method: EstMethod::Confidence,
        parnames: thawed_names(fit),
        parvals: fit.thawed_pars(),
        parmins,
        parmaxes,
    })
}

/// Statistic profile along one parameter, evaluated on a private copy.
struct Profile<'a> {
    base: &'a DataFit,
    work: DataFit,
    idx: usize,
}

impl<'a> Profile<'a> {
    fn new(base: &'a DataFit, idx: usize) -> Self {
        let mut work = base.clone();
        work.model.pars[idx].freeze();
        Self { base, work, idx }
    }

    /// Best statistic with the parameter pinned at `v`.
    fn at(&mut self, v: f64) -> Result<f64, FitError> {
        for (w, b) in self.work.model.pars.iter_mut().zip(&self.base.model.pars) {
            w.val = b.val;
        }
        self.work.model.pars[self.idx].val = v;

        if self.work.thawed_count() == 0 {
            return self.work.calc_stat();
        }
        Ok(self.work.minimize()?.fval)
    }

    /// Signed offset from the best fit to the `target` crossing in direction
    /// `dir`, or `None` when the hard limit is reached first.
    fn bound(&mut self, dir: f64, step: f64, target: f64) -> Result<Option<f64>, FitError> {
        let par = &self.base.model.pars[self.idx];
        let (val, limit) = (par.val, if dir > 0.0 { par.max } else { par.min });

        let mut inner = val;
        let mut outer = None;
        let mut step = step;
        for _ in 0..MAX_EXPANSIONS {
            let cand = val + dir * step;
            let cand = if (cand - limit) * dir >= 0.0 { limit } else { cand };
            if self.at(cand)? >= target {
                outer = Some(cand);
                break;
            }
            if cand == limit {
                return Ok(None);
            }
            inner = cand;
            step *= 2.0;
        }
        let Some(mut outer) = outer else {
            return Ok(None);
        };

        let tol = 1e-8 * (1.0 + val.abs());
        for _ in 0..MAX_BISECTIONS {
            if (outer - inner).abs() <= tol {
                break;
            }
            let mid = 0.5 * (inner + outer);
            if self.at(mid)? >= target {
                outer = mid;
            } else {
                inner = mid;
            }
        }
        Ok(Some(0.5 * (inner + outer) - val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Parameter;
    use crate::fit::{Dataset, Model};
    use crate::stats::Chi2;

    /// Constant model over four points with unit-free errors of 2:
    /// chi2 = Σ (d - c)² / 4, so σ(c) = 2 / √4 = 1.
    fn constant_fit() -> DataFit {
        let data = Dataset::new("d", vec![0.0, 1.0, 2.0, 3.0], vec![9.0, 11.0, 10.0, 10.0])
            .unwrap()
            .with_staterror(vec![2.0; 4])
            .unwrap();
        let model = Model::new("const", vec![Parameter::new("const.c0", 10.0, -100.0, 100.0)], |p, _| p[0]);
        DataFit::new(data, model, Chi2)
    }

    #[test]
    fn covariance_matches_analytic_sigma() {
        let fit = constant_fit();
        let est = covariance_errors(&fit).unwrap();
        assert_eq!(est.parnames, vec!["const.c0".to_string()]);
        assert!((est.parmins[0].unwrap() + 1.0).abs() < 1e-4);
        assert!((est.parmaxes[0].unwrap() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn confidence_matches_covariance_for_quadratic_statistic() {
        let fit = constant_fit();
        let est = confidence_errors(&fit).unwrap();
        assert_eq!(est.method, EstMethod::Confidence);
        assert!((est.parmins[0].unwrap() + 1.0).abs() < 1e-5);
        assert!((est.parmaxes[0].unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn confidence_bound_at_hard_limit_is_none() {
        let mut fit = constant_fit();
        fit.pars_mut()[0].max = 10.5;
        let est = confidence_errors(&fit).unwrap();
        assert!(est.parmins[0].is_some());
        assert_eq!(est.parmaxes[0], None);
    }

    #[test]
    fn estimates_leave_the_fit_untouched() {
        let mut fit = crate::test_utils::line_fit(2.0, 3.0);
        let before = fit.pars().to_vec();
        fit.est_errors().unwrap();
        fit.set_estmethod(EstMethod::Confidence);
        fit.est_errors().unwrap();
        assert_eq!(fit.pars(), before.as_slice());
    }

    #[test]
    fn flat_statistic_gives_no_covariance_bounds() {
        let data = Dataset::new("d", vec![0.0, 1.0], vec![1.0, 1.0]).unwrap();
        // The second parameter never enters the model.
        let model = Model::new(
            "flat",
            vec![Parameter::unbounded("flat.a", 1.0), Parameter::unbounded("flat.b", 0.0)],
            |p, _| p[0],
        );
        let fit = DataFit::new(data, model, Chi2);
        let est = covariance_errors(&fit).unwrap();
        assert_eq!(est.parmins, vec![None, None]);
        assert_eq!(est.parmaxes, vec![None, None]);
    }
}
