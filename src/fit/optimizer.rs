//! Bounded minimizers used by the reference fit.
//!
//! Every candidate point is clamped into the parameter box before it is
//! evaluated, so objectives never see out-of-limit values.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::math::{damped_step, jacobian};

/// Tuning knobs shared by all minimizers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptConfig {
    /// Relative tolerance on the objective.
    pub ftol: f64,
    /// Evaluation budget; `None` scales with the number of free parameters.
    pub maxfev: Option<usize>,
    /// Seed for Monte-Carlo restarts.
    pub seed: u64,
    /// Number of random restarts for Monte-Carlo.
    pub restarts: usize,
}

impl Default for OptConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            maxfev: None,
            seed: 0x5eed,
            restarts: 8,
        }
    }
}

impl OptConfig {
    fn budget(&self, n: usize, per_param: usize) -> usize {
        self.maxfev.unwrap_or(per_param * (n + 1))
    }
}

/// Box constraints for a minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn clamp(&self, x: &mut [f64]) {
        for ((v, lo), hi) in x.iter_mut().zip(&self.lower).zip(&self.upper) {
            *v = v.max(*lo).min(*hi);
        }
    }

    fn clamped(&self, mut x: Vec<f64>) -> Vec<f64> {
        self.clamp(&mut x);
        x
    }
}

/// Result of a minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fval: f64,
    pub nfev: usize,
    pub converged: bool,
}

fn close(a: f64, b: f64, ftol: f64) -> bool {
    (a - b).abs() <= ftol * (a.abs() + b.abs()) + f64::EPSILON
}

/// Nelder-Mead simplex.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], bounds: &Bounds, cfg: &OptConfig) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    let maxfev = cfg.budget(n, 400);
    let mut nfev = 0usize;
    let mut eval = |x: &[f64], nfev: &mut usize| {
        *nfev += 1;
        let v = f(x);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    let start = bounds.clamped(x0.to_vec());
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let f_start = eval(&start, &mut nfev);
    simplex.push((start.clone(), f_start));
    for i in 0..n {
        let mut x = start.clone();
        let step = if x[i] != 0.0 { 0.05 * x[i] } else { 0.00025 };
        x[i] += step;
        bounds.clamp(&mut x);
        if x[i] == start[i] {
            x[i] -= step;
            bounds.clamp(&mut x);
        }
        let fx = eval(&x, &mut nfev);
        simplex.push((x, fx));
    }

    let mut converged = false;
    while nfev < maxfev {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let f_best = simplex[0].1;
        let f_worst = simplex[n].1;
        let spread = simplex.iter().skip(1).all(|(x, _)| {
            x.iter()
                .zip(&simplex[0].0)
                .all(|(a, b)| (a - b).abs() <= 1e-9 * (1.0 + b.abs()))
        });
        if (f_best.is_finite() && close(f_best, f_worst, cfg.ftol)) || spread {
            converged = true;
            break;
        }

        let mut centroid = vec![0.0; n];
        for (x, _) in &simplex[..n] {
            for (c, v) in centroid.iter_mut().zip(x) {
                *c += v / n as f64;
            }
        }
        let along = |t: f64, from: &[f64]| -> Vec<f64> {
            bounds.clamped(
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, w)| c + t * (c - w))
                    .collect(),
            )
        };

        let worst = simplex[n].0.clone();
        let xr = along(1.0, &worst);
        let fr = eval(&xr, &mut nfev);

        if fr < f_best {
            let xe = along(2.0, &worst);
            let fe = eval(&xe, &mut nfev);
            simplex[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
        } else if fr < simplex[n - 1].1 {
            simplex[n] = (xr, fr);
        } else {
            let (xc, fc) = if fr < f_worst {
                let xc = along(0.5, &worst);
                let fc = eval(&xc, &mut nfev);
                (xc, fc)
            } else {
                let xc = along(-0.5, &worst);
                let fc = eval(&xc, &mut nfev);
                (xc, fc)
            };
            if fc < fr.min(f_worst) {
                simplex[n] = (xc, fc);
            } else {
                let best = simplex[0].0.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let x: Vec<f64> = best
                        .iter()
                        .zip(&vertex.0)
                        .map(|(b, v)| b + 0.5 * (v - b))
                        .collect();
                    let fx = eval(&x, &mut nfev);
                    *vertex = (x, fx);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (x, fval) = simplex.swap_remove(0);
    Minimum {
        x,
        fval,
        nfev,
        converged,
    }
}

/// Levenberg-Marquardt on a residual function (objective = ‖r‖²).
///
/// Returns `None` if the residuals cannot be evaluated at the start point.
pub fn levmar<R>(mut resid: R, x0: &[f64], bounds: &Bounds, cfg: &OptConfig) -> Option<Minimum>
where
    R: FnMut(&[f64]) -> Option<Vec<f64>>,
{
    let n = x0.len();
    let maxfev = cfg.budget(n, 200);
    let mut x = bounds.clamped(x0.to_vec());
    let mut r = resid(&x)?;
    let mut fval = sq_norm(&r);
    let mut nfev = 1usize;
    let mut lambda = 1e-3;

    while nfev < maxfev {
        if fval == 0.0 {
            return Some(Minimum { x, fval, nfev, converged: true });
        }
        let Some(jac) = jacobian(&x, &r, &mut resid) else {
            break;
        };
        nfev += n;
        let rv = DVector::from_column_slice(&r);

        let mut improved = false;
        while lambda < 1e12 && nfev < maxfev {
            let Some(step) = damped_step(&jac, &rv, lambda) else {
                lambda *= 10.0;
                continue;
            };
            let xn = bounds.clamped(x.iter().zip(step.iter()).map(|(a, d)| a + d).collect());
            nfev += 1;
            match resid(&xn) {
                Some(rn) if sq_norm(&rn) < fval => {
                    let f_new = sq_norm(&rn);
                    let done = close(fval, f_new, cfg.ftol);
                    x = xn;
                    r = rn;
                    fval = f_new;
                    lambda = (lambda * 0.1).max(1e-12);
                    improved = true;
                    if done {
                        return Some(Minimum { x, fval, nfev, converged: true });
                    }
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        if !improved {
            // No downhill step at any damping: a stationary point within the box.
            return Some(Minimum {
                x,
                fval,
                nfev,
                converged: lambda >= 1e12,
            });
        }
    }

    Some(Minimum {
        x,
        fval,
        nfev,
        converged: false,
    })
}

/// Simplex runs from random restarts around the incumbent, then a polish.
pub fn moncar<F>(mut f: F, x0: &[f64], bounds: &Bounds, cfg: &OptConfig) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut best = nelder_mead(&mut f, x0, bounds, cfg);
    let mut nfev = best.nfev;

    for _ in 0..cfg.restarts {
        let start: Vec<f64> = best
            .x
            .iter()
            .map(|&v| {
                let scale = 0.5 * v.abs().max(1.0);
                v + scale * rng.gen_range(-1.0..1.0)
            })
            .collect();
        let trial = nelder_mead(&mut f, &start, bounds, cfg);
        nfev += trial.nfev;
        if trial.fval < best.fval {
            best = trial;
        }
    }

    let polished = nelder_mead(&mut f, &best.x, bounds, cfg);
    nfev += polished.nfev;
    let mut out = if polished.fval <= best.fval { polished } else { best };
    out.nfev = nfev;
    out
}

fn sq_norm(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}
