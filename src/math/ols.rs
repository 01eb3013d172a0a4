//! Linear least-squares solver.
//!
//! Levenberg-Marquardt repeatedly solves small damped systems of the form:
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! which is an ordinary least-squares problem on the stacked matrix
//! `[J; √λ D]` against `[-r; 0]`. The stacked matrix is tall, so we solve via
//! SVD (nalgebra's `QR::solve` only handles square systems).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser tolerances before giving up on a near-singular Jacobian.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve one damped Gauss-Newton step `(JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr`.
///
/// The system is stacked as `[J; √λ D] δ = [-r; 0]` with `D` the column norms
/// of `J` (floored so a flat direction still gets damping).
pub fn damped_step(jac: &DMatrix<f64>, resid: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let (m, n) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    let mut b = DVector::<f64>::zeros(m + n);

    a.view_mut((0, 0), (m, n)).copy_from(jac);
    for i in 0..m {
        b[i] = -resid[i];
    }
    let sqrt_lambda = lambda.max(0.0).sqrt();
    for j in 0..n {
        let norm = jac.column(j).norm().max(1e-12);
        a[(m + j, j)] = sqrt_lambda * norm;
    }

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn undamped_step_is_gauss_newton() {
        // r(p) = p - 3 at p = 0: J = [1], r = [-3], so δ = 3.
        let jac = DMatrix::from_row_slice(1, 1, &[1.0]);
        let resid = DVector::from_row_slice(&[-3.0]);
        let step = damped_step(&jac, &resid, 0.0).unwrap();
        assert!((step[0] - 3.0).abs() < 1e-10);

        let damped = damped_step(&jac, &resid, 1.0).unwrap();
        assert!(damped[0] > 0.0 && damped[0] < 3.0);
    }
}
