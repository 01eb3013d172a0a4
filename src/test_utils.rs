//! Fixtures shared by the unit tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::domain::{ErrorEstimate, EstMethod, FitResult, OptMethod, Parameter};
use crate::error::FitError;
use crate::fit::{DataFit, Dataset, Fit, FitOptions, Lifecycle, Model};
use crate::stats::{Chi2, Statistic};

/// A separable quadratic bowl: `stat = Σ wᵢ (vᵢ - cᵢ)²` with the centres at
/// the starting values.
///
/// `fit` moves every thawed parameter onto its centre, so each thawed
/// parameter has covariance error `1 / √wᵢ`.
#[derive(Debug, Clone)]
pub(crate) struct QuadraticFit {
    pub pars: Vec<Parameter>,
    pub centers: Vec<f64>,
    pub weights: Vec<f64>,
    pub stat: Arc<dyn Statistic>,
    pub method: OptMethod,
    pub estmethod: EstMethod,
    pub lifecycle: Lifecycle,
    /// Upper bound on a random sleep inside every statistic evaluation.
    pub jitter: Option<Duration>,
    /// `calc_stat` fails once parameter `.0` exceeds `.1`.
    pub fail_above: Option<(usize, f64)>,
    /// Returned from `est_errors` instead of the analytic estimate.
    pub estimate: Option<ErrorEstimate>,
    /// Estimator that was active during the last `est_errors` call.
    pub last_estmethod: Option<EstMethod>,
}

impl QuadraticFit {
    pub fn new(pars: &[(&str, f64)]) -> Self {
        Self {
            pars: pars
                .iter()
                .map(|&(name, val)| Parameter::new(name, val, -1e3, 1e3))
                .collect(),
            centers: pars.iter().map(|&(_, v)| v).collect(),
            weights: vec![1.0; pars.len()],
            stat: Arc::new(Chi2),
            method: OptMethod::LevMar,
            estmethod: EstMethod::Confidence,
            lifecycle: Lifecycle::default(),
            jitter: None,
            fail_above: None,
            estimate: None,
            last_estmethod: None,
        }
    }

    pub fn with_stat<S: Statistic + 'static>(mut self, stat: S) -> Self {
        self.stat = Arc::new(stat);
        self
    }

    /// Statistic at explicit values, ignoring jitter and failure injection.
    pub fn stat_of(&self, vals: &[f64]) -> f64 {
        vals.iter()
            .zip(&self.centers)
            .zip(&self.weights)
            .map(|((v, c), w)| w * (v - c) * (v - c))
            .sum()
    }
}

impl Fit for QuadraticFit {
    fn model_name(&self) -> &str {
        "quad"
    }

    fn pars(&self) -> &[Parameter] {
        &self.pars
    }

    fn pars_mut(&mut self) -> &mut [Parameter] {
        &mut self.pars
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
        if let Some(max) = self.jitter {
            let micros = rand::thread_rng().gen_range(0..=max.as_micros() as u64);
            thread::sleep(Duration::from_micros(micros));
        }
        if let Some((idx, limit)) = self.fail_above {
            let value = self.pars[idx].val;
            if value > limit {
                return Err(FitError::NonFiniteStat { value: f64::NAN });
            }
        }
        let vals: Vec<f64> = self.pars.iter().map(|p| p.val).collect();
        Ok(self.stat_of(&vals))
    }

    fn fit(&mut self, opts: FitOptions) -> Result<FitResult, FitError> {
        if !opts.reuse_setup {
            self.startup();
        }
        for (par, &c) in self.pars.iter_mut().zip(&self.centers) {
            if !par.frozen {
                par.val = par.clamp(c);
            }
        }
        let outcome = self.calc_stat();
        if !opts.reuse_setup {
            self.teardown();
        }
        Ok(FitResult {
            statval: outcome?,
            parvals: self.thawed_pars(),
            nfev: 1,
            method: self.method,
        })
    }

    fn est_errors(&mut self) -> Result<ErrorEstimate, FitError> {
        self.last_estmethod = Some(self.estmethod);
        if let Some(est) = &self.estimate {
            return Ok(est.clone());
        }
        let free = self.pars.iter().zip(&self.weights).filter(|(p, _)| !p.frozen);
        let (names, sig): (Vec<String>, Vec<f64>) =
            free.map(|(p, w)| (p.fullname.clone(), 1.0 / w.sqrt())).unzip();
        Ok(ErrorEstimate {
            method: self.estmethod,
            parnames: names,
            parvals: self.thawed_pars(),
            parmins: sig.iter().map(|s| Some(-s)).collect(),
            parmaxes: sig.iter().map(|&s| Some(s)).collect(),
        })
    }

    fn startup(&mut self) {
        self.lifecycle.startups += 1;
    }

    fn teardown(&mut self) {
        self.lifecycle.teardowns += 1;
    }
}

/// Line `y = a + b x` on `x = 0..10` with exact data and a chi-square
/// statistic (data-variance errors).
pub(crate) fn line_fit(a: f64, b: f64) -> DataFit {
    let x: Vec<f64> = (0..10).map(f64::from).collect();
    let y = x.iter().map(|xi| a + b * xi).collect();
    let data = Dataset::new("line", x, y).unwrap();
    DataFit::new(data, line_model(a, b), Chi2)
}

/// Same line with Gaussian noise of width `sigma`, seeded, fitted to its
/// best-fit values.
pub(crate) fn noisy_line_fit(a: f64, b: f64, sigma: f64, seed: u64) -> DataFit {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();
    let x: Vec<f64> = (0..20).map(|i| f64::from(i) * 0.5).collect();
    let y = x.iter().map(|xi| a + b * xi + noise.sample(&mut rng)).collect();
    let data = Dataset::new("noisy-line", x, y)
        .unwrap()
        .with_staterror(vec![sigma; 20])
        .unwrap();
    let mut fit = DataFit::new(data, line_model(a, b), Chi2);
    fit.fit(FitOptions::default()).unwrap();
    fit
}

fn line_model(a: f64, b: f64) -> Model {
    Model::new(
        "line",
        vec![
            Parameter::new("line.c0", a, -100.0, 100.0),
            Parameter::new("line.c1", b, -100.0, 100.0),
        ],
        |p, x| p[0] + p[1] * x,
    )
}
