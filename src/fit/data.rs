//! Reference fit over an in-memory 1-D dataset.
//!
//! `DataFit` bundles:
//!
//! - a shared, immutable [`Dataset`] (`x`, `y`, optional per-point errors)
//! - a [`Model`]: named parameters plus a pure model function `f(pars, x)`
//! - a shared [`Statistic`]
//! - the active optimizer and error estimator
//!
//! Data, model function and statistic sit behind `Arc`, so cloning a fit only
//! copies the parameter vector. Scans rely on that to give every worker its
//! own copy.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{ErrorEstimate, EstMethod, FitResult, OptMethod, Parameter};
use crate::error::FitError;
use crate::fit::estimate::{confidence_errors, covariance_errors};
use crate::fit::optimizer::{levmar, moncar, nelder_mead, Bounds, Minimum, OptConfig};
use crate::fit::{Fit, FitOptions};
use crate::stats::Statistic;

/// Observed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub staterror: Option<Vec<f64>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, FitError> {
        if x.is_empty() {
            return Err(FitError::EmptyData);
        }
        if x.len() != y.len() {
            return Err(FitError::DataShape {
                message: format!("x has {} points, y has {}", x.len(), y.len()),
            });
        }
        Ok(Self {
            name: name.into(),
            x,
            y,
            staterror: None,
        })
    }

    /// Attach per-point errors (must be positive, one per point).
    pub fn with_staterror(mut self, staterror: Vec<f64>) -> Result<Self, FitError> {
        if staterror.len() != self.y.len() {
            return Err(FitError::DataShape {
                message: format!("staterror has {} points, y has {}", staterror.len(), self.y.len()),
            });
        }
        if staterror.iter().any(|e| !(e.is_finite() && *e > 0.0)) {
            return Err(FitError::DataShape {
                message: "staterror entries must be positive and finite".to_string(),
            });
        }
        self.staterror = Some(staterror);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

type ModelFn = dyn Fn(&[f64], f64) -> f64 + Send + Sync;

/// A parametric model `f(pars, x)`.
#[derive(Clone)]
pub struct Model {
    pub name: String,
    pub pars: Vec<Parameter>,
    func: Arc<ModelFn>,
}

impl Model {
    pub fn new<F>(name: impl Into<String>, pars: Vec<Parameter>, func: F) -> Self
    where
        F: Fn(&[f64], f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pars,
            func: Arc::new(func),
        }
    }

    /// Evaluate at every `x` with explicit parameter values.
    pub fn eval_with(&self, vals: &[f64], x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| (self.func)(vals, xi)).collect()
    }

    /// Evaluate at every `x` with the current parameter values.
    pub fn eval(&self, x: &[f64]) -> Vec<f64> {
        let vals: Vec<f64> = self.pars.iter().map(|p| p.val).collect();
        self.eval_with(&vals, x)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("pars", &self.pars)
            .finish_non_exhaustive()
    }
}

/// How often the model lifecycle hooks ran (observable by callers and tests).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub startups: usize,
    pub teardowns: usize,
}

/// The reference [`Fit`] implementation.
#[derive(Debug, Clone)]
pub struct DataFit {
    data: Arc<Dataset>,
    pub(crate) model: Model,
    stat: Arc<dyn Statistic>,
    method: OptMethod,
    estmethod: EstMethod,
    pub opt_config: OptConfig,
    /// Effective per-point errors, cached between `startup` and `teardown`.
    cached_staterror: Option<Arc<[f64]>>,
    lifecycle: Lifecycle,
}

impl DataFit {
    /// A fit using Levenberg-Marquardt and the covariance estimator.
    pub fn new<S: Statistic + 'static>(data: Dataset, model: Model, stat: S) -> Self {
        Self {
            data: Arc::new(data),
            model,
            stat: Arc::new(stat),
            method: OptMethod::LevMar,
            estmethod: EstMethod::Covariance,
            opt_config: OptConfig::default(),
            cached_staterror: None,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_method(mut self, method: OptMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_estmethod(mut self, method: EstMethod) -> Self {
        self.estmethod = method;
        self
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Model values at the data points for the current parameters.
    pub fn model_values(&self) -> Vec<f64> {
        self.model.eval(&self.data.x)
    }

    /// Per-point errors the statistic works with: the data's own, or the
    /// statistic's estimate from the data when it has one.
    pub fn effective_staterror(&self) -> Option<Vec<f64>> {
        match &self.data.staterror {
            Some(err) => Some(err.clone()),
            None if self.stat.has_staterror() => Some(self.stat.calc_staterror(&self.data.y)),
            None => None,
        }
    }

    pub(crate) fn staterror_for_stat(&self) -> Option<Arc<[f64]>> {
        self.cached_staterror
            .clone()
            .or_else(|| self.effective_staterror().map(Arc::from))
    }

    /// Statistic with the thawed parameters replaced by `thawed`; non-finite
    /// values are returned as-is for the optimizers to reject.
    pub(crate) fn stat_at(&self, thawed: &[f64], err: Option<&[f64]>) -> f64 {
        let vals = self.full_values(thawed);
        let model = self.model.eval_with(&vals, &self.data.x);
        self.stat.calc_stat(&self.data.y, &model, err)
    }

    fn resid_at(&self, thawed: &[f64], err: Option<&[f64]>) -> Option<Vec<f64>> {
        let vals = self.full_values(thawed);
        let model = self.model.eval_with(&vals, &self.data.x);
        let r = self.stat.residuals(&self.data.y, &model, err)?;
        r.iter().all(|v| v.is_finite()).then_some(r)
    }

    fn full_values(&self, thawed: &[f64]) -> Vec<f64> {
        let mut vals: Vec<f64> = self.model.pars.iter().map(|p| p.val).collect();
        let free = self.model.pars.iter().enumerate().filter(|(_, p)| !p.frozen);
        for ((i, _), &v) in free.zip(thawed) {
            vals[i] = v;
        }
        vals
    }

    pub(crate) fn thawed_bounds(&self) -> Bounds {
        let free = self.model.pars.iter().filter(|p| !p.frozen);
        let (lower, upper): (Vec<f64>, Vec<f64>) = free.map(|p| (p.min, p.max)).unzip();
        Bounds { lower, upper }
    }

    pub(crate) fn minimize(&self) -> Result<Minimum, FitError> {
        let x0 = self.thawed_pars();
        if x0.is_empty() {
            return Err(FitError::NoThawedParameters);
        }
        let bounds = self.thawed_bounds();
        let err = self.staterror_for_stat();
        let err = err.as_deref();
        let cfg = &self.opt_config;

        let min = match self.method {
            OptMethod::LevMar => {
                if self.stat.is_likelihood() {
                    return Err(FitError::UnsupportedMethod {
                        method: self.method.name(),
                        stat: self.stat.name(),
                    });
                }
                levmar(|p: &[f64]| self.resid_at(p, err), &x0, &bounds, cfg).ok_or_else(|| {
                    FitError::NonFiniteStat {
                        value: self.stat_at(&x0, err),
                    }
                })?
            }
            OptMethod::NelderMead => nelder_mead(|p: &[f64]| self.stat_at(p, err), &x0, &bounds, cfg),
            OptMethod::MonCar => moncar(|p: &[f64]| self.stat_at(p, err), &x0, &bounds, cfg),
        };

        if !min.fval.is_finite() {
            return Err(FitError::NonFiniteStat { value: min.fval });
        }
        if !min.converged {
            return Err(FitError::NonConvergence {
                method: self.method.name(),
                nfev: min.nfev,
            });
        }
        Ok(min)
    }
}

impl Fit for DataFit {
    fn model_name(&self) -> &str {
        &self.model.name
    }

    fn pars(&self) -> &[Parameter] {
        &self.model.pars
    }

    fn pars_mut(&mut self) -> &mut [Parameter] {
        &mut self.model.pars
    }

    fn stat(&self) -> &dyn Statistic {
        self.stat.as_ref()
    }

    fn method(&self) -> OptMethod {
        self.method
    }

    fn set_method(&mut self, method: OptMethod) {
        self.method = method;
    }

    fn estmethod(&self) -> EstMethod {
        self.estmethod
    }

    fn set_estmethod(&mut self, method: EstMethod) {
        self.estmethod = method;
    }

    fn calc_stat(&self) -> Result<f64, FitError> {
        let err = self.staterror_for_stat();
        let value = self.stat_at(&self.thawed_pars(), err.as_deref());
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FitError::NonFiniteStat { value })
        }
    }

    fn fit(&mut self, opts: FitOptions) -> Result<FitResult, FitError> {
        if !opts.reuse_setup {
            self.startup();
        }
        let outcome = self.minimize();
        if !opts.reuse_setup {
            self.teardown();
        }
        let min = outcome?;

        self.set_thawed_pars(&min.x)?;
        debug!(
            method = self.method.name(),
            statval = min.fval,
            nfev = min.nfev,
            "fit converged"
        );
        Ok(FitResult {
            statval: min.fval,
            parvals: min.x,
            nfev: min.nfev,
            method: self.method,
        })
    }

    fn est_errors(&mut self) -> Result<ErrorEstimate, FitError> {
        match self.estmethod {
            EstMethod::Covariance => covariance_errors(self),
            EstMethod::Confidence => confidence_errors(self),
        }
    }

    fn startup(&mut self) {
        self.cached_staterror = self.effective_staterror().map(Arc::from);
        self.lifecycle.startups += 1;
    }

    fn teardown(&mut self) {
        self.cached_staterror = None;
        self.lifecycle.teardowns += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Cash, Chi2};
    use crate::test_utils::line_fit;

    #[test]
    fn dataset_rejects_mismatched_lengths() {
        let err = Dataset::new("d", vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, FitError::DataShape { .. }));
        assert_eq!(Dataset::new("d", vec![], vec![]).unwrap_err(), FitError::EmptyData);
    }

    #[test]
    fn est_errors_follows_the_configured_estimator() {
        let mut fit = line_fit(2.0, 3.0);
        assert_eq!(fit.estmethod(), EstMethod::Covariance);
        assert_eq!(fit.est_errors().unwrap().method, EstMethod::Covariance);

        let mut fit = line_fit(2.0, 3.0).with_estmethod(EstMethod::Confidence);
        assert_eq!(fit.estmethod(), EstMethod::Confidence);
        let est = fit.est_errors().unwrap();
        assert_eq!(est.method, EstMethod::Confidence);
        assert_eq!(est.parnames.len(), 2);
    }

    #[test]
    fn levmar_recovers_line_parameters() {
        let mut fit = line_fit(2.0, 3.0);
        fit.pars_mut()[0].val = 0.0;
        fit.pars_mut()[1].val = 0.0;

        let result = fit.fit(FitOptions::default()).unwrap();
        assert!(result.statval < 1e-10);
        assert!((fit.pars()[0].val - 2.0).abs() < 1e-6);
        assert!((fit.pars()[1].val - 3.0).abs() < 1e-6);
    }

    #[test]
    fn fit_runs_lifecycle_unless_reusing_setup() {
        let mut fit = line_fit(2.0, 3.0);
        fit.fit(FitOptions::default()).unwrap();
        assert_eq!(fit.lifecycle(), Lifecycle { startups: 1, teardowns: 1 });

        fit.fit(FitOptions::reusing_setup()).unwrap();
        assert_eq!(fit.lifecycle(), Lifecycle { startups: 1, teardowns: 1 });
    }

    #[test]
    fn frozen_parameters_are_not_moved_by_fit() {
        let mut fit = line_fit(2.0, 3.0);
        fit.pars_mut()[0].val = 1.5;
        fit.pars_mut()[0].freeze();
        fit.fit(FitOptions::default()).unwrap();
        assert_eq!(fit.pars()[0].val, 1.5);
    }

    #[test]
    fn levmar_refuses_likelihood_statistics() {
        let data = Dataset::new("counts", vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]).unwrap();
        let model = Model::new("const", vec![Parameter::new("const.c0", 1.0, 0.0, 100.0)], |p, _| p[0]);
        let mut fit = DataFit::new(data, model, Cash);
        let err = fit.fit(FitOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::UnsupportedMethod { .. }));

        fit.set_method(OptMethod::NelderMead);
        fit.fit(FitOptions::default()).unwrap();
        // Cash for a constant model is minimized at the data mean.
        assert!((fit.pars()[0].val - 4.0).abs() < 1e-3);
    }

    #[test]
    fn clones_share_data_but_not_parameters() {
        let data = Dataset::new("d", vec![0.0], vec![1.0]).unwrap();
        let model = Model::new("const", vec![Parameter::unbounded("const.c0", 1.0)], |p, _| p[0]);
        let fit = DataFit::new(data, model, Chi2);
        let mut other = fit.clone();
        other.pars_mut()[0].val = 5.0;
        assert_eq!(fit.pars()[0].val, 1.0);
        assert!(Arc::ptr_eq(&fit.data, &other.data));
    }
}
