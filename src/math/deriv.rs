//! Finite-difference derivatives.
//!
//! Step sizes scale with the magnitude of each coordinate so parameters with
//! very different units get comparable relative perturbations.

use nalgebra::{DMatrix, DVector};

/// Relative step for forward differences.
const FWD_STEP: f64 = 1e-7;

/// Relative step for central second differences.
const HESS_STEP: f64 = 1e-4;

fn step_for(x: f64, rel: f64) -> f64 {
    rel * x.abs().max(1.0)
}

/// Forward-difference Jacobian of a vector function at `x`.
///
/// `f0` is `f(x)`, already computed by the caller. Returns `None` when any
/// evaluation fails.
pub fn jacobian<F>(x: &[f64], f0: &[f64], mut f: F) -> Option<DMatrix<f64>>
where
    F: FnMut(&[f64]) -> Option<Vec<f64>>,
{
    let m = f0.len();
    let n = x.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut xp = x.to_vec();

    for j in 0..n {
        let h = step_for(x[j], FWD_STEP);
        xp[j] = x[j] + h;
        let fp = f(&xp)?;
        xp[j] = x[j];
        for i in 0..m {
            jac[(i, j)] = (fp[i] - f0[i]) / h;
        }
    }
    Some(jac)
}

/// Central-difference Hessian of a scalar function at `x`.
pub fn hessian<F>(x: &[f64], mut f: F) -> Option<DMatrix<f64>>
where
    F: FnMut(&[f64]) -> Option<f64>,
{
    let n = x.len();
    let f0 = f(x)?;
    let h: Vec<f64> = x.iter().map(|&v| step_for(v, HESS_STEP)).collect();
    let mut hess = DMatrix::<f64>::zeros(n, n);
    let mut xp = x.to_vec();

    for i in 0..n {
        xp[i] = x[i] + h[i];
        let fp = f(&xp)?;
        xp[i] = x[i] - h[i];
        let fm = f(&xp)?;
        xp[i] = x[i];
        hess[(i, i)] = (fp - 2.0 * f0 + fm) / (h[i] * h[i]);
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let mut corner = |si: f64, sj: f64| {
                xp[i] = x[i] + si * h[i];
                xp[j] = x[j] + sj * h[j];
                let v = f(&xp);
                xp[i] = x[i];
                xp[j] = x[j];
                v
            };
            let fpp = corner(1.0, 1.0)?;
            let fpm = corner(1.0, -1.0)?;
            let fmp = corner(-1.0, 1.0)?;
            let fmm = corner(-1.0, -1.0)?;
            let v = (fpp - fpm - fmp + fmm) / (4.0 * h[i] * h[j]);
            hess[(i, j)] = v;
            hess[(j, i)] = v;
        }
    }
    Some(hess)
}

/// Diagonal square roots of a covariance matrix (`None` for non-positive entries).
pub fn sigmas(cov: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        cov.nrows(),
        (0..cov.nrows()).map(|i| {
            let v = cov[(i, i)];
            if v > 0.0 && v.is_finite() { v.sqrt() } else { f64::NAN }
        }),
    )
}
