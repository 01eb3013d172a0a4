//! Goodness-of-fit statistics.
//!
//! The scan engine never matches statistics by name. It asks the capability
//! flags on [`Statistic`]:
//!
//! - `is_likelihood`: picks Nelder-Mead over Levenberg-Marquardt in fast
//!   projection scans
//! - `has_staterror`: whether per-point errors exist for residual displays
//! - `supports_confidence`: whether confidence scans make sense at all
//!
//! The concrete statistics here back the reference `DataFit`.

use std::fmt;

/// Floor applied to model values inside logarithms.
const TINY: f64 = 1e-300;

/// A scalar goodness-of-fit statistic.
pub trait Statistic: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Likelihood-class statistic (minimized by simplex rather than LM).
    fn is_likelihood(&self) -> bool {
        false
    }

    /// Per-point errors are available for residual displays.
    fn has_staterror(&self) -> bool {
        true
    }

    /// Confidence scans are meaningful with this statistic.
    fn supports_confidence(&self) -> bool {
        true
    }

    /// Statistic value for observed `data` against `model`.
    fn calc_stat(&self, data: &[f64], model: &[f64], staterror: Option<&[f64]>) -> f64;

    /// Residual vector whose squared norm equals the statistic, if one exists.
    ///
    /// Levenberg-Marquardt needs this; likelihood statistics return `None`.
    fn residuals(&self, data: &[f64], model: &[f64], staterror: Option<&[f64]>) -> Option<Vec<f64>>;

    /// Per-point errors derived from the data alone.
    fn calc_staterror(&self, data: &[f64]) -> Vec<f64> {
        data.iter().map(|y| y.abs().max(1.0).sqrt()).collect()
    }
}

/// Chi-square with data errors, falling back to data variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chi2;

impl Statistic for Chi2 {
    fn name(&self) -> &'static str {
        "chi2"
    }

    fn calc_stat(&self, data: &[f64], model: &[f64], staterror: Option<&[f64]>) -> f64 {
        self.residuals(data, model, staterror)
            .map(|r| r.iter().map(|v| v * v).sum())
            .unwrap_or(f64::NAN)
    }

    fn residuals(&self, data: &[f64], model: &[f64], staterror: Option<&[f64]>) -> Option<Vec<f64>> {
        let fallback;
        let err = match staterror {
            Some(err) => err,
            None => {
                fallback = self.calc_staterror(data);
                &fallback
            }
        };
        Some(
            data.iter()
                .zip(model)
                .zip(err)
                .map(|((d, m), e)| (d - m) / e)
                .collect(),
        )
    }
}

/// Unweighted least squares.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSq;

impl Statistic for LeastSq {
    fn name(&self) -> &'static str {
        "leastsq"
    }

    fn has_staterror(&self) -> bool {
        false
    }

    fn supports_confidence(&self) -> bool {
        false
    }

    fn calc_stat(&self, data: &[f64], model: &[f64], _staterror: Option<&[f64]>) -> f64 {
        data.iter().zip(model).map(|(d, m)| (d - m) * (d - m)).sum()
    }

    fn residuals(&self, data: &[f64], model: &[f64], _staterror: Option<&[f64]>) -> Option<Vec<f64>> {
        Some(data.iter().zip(model).map(|(d, m)| d - m).collect())
    }
}

/// Cash maximum-likelihood statistic for Poisson counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cash;

impl Statistic for Cash {
    fn name(&self) -> &'static str {
        "cash"
    }

    fn is_likelihood(&self) -> bool {
        true
    }

    fn has_staterror(&self) -> bool {
        false
    }

    fn calc_stat(&self, data: &[f64], model: &[f64], _staterror: Option<&[f64]>) -> f64 {
        let mut sum = 0.0;
        for (&d, &m) in data.iter().zip(model) {
            if m <= 0.0 && d > 0.0 {
                return f64::INFINITY;
            }
            sum += m - d * m.max(TINY).ln();
        }
        2.0 * sum
    }

    fn residuals(&self, _data: &[f64], _model: &[f64], _staterror: Option<&[f64]>) -> Option<Vec<f64>> {
        None
    }
}

/// Castor's C statistic (Cash shifted so a perfect model gives zero).
#[derive(Debug, Clone, Copy, Default)]
pub struct CStat;

impl Statistic for CStat {
    fn name(&self) -> &'static str {
        "cstat"
    }

    fn is_likelihood(&self) -> bool {
        true
    }

    fn has_staterror(&self) -> bool {
        false
    }

    fn calc_stat(&self, data: &[f64], model: &[f64], _staterror: Option<&[f64]>) -> f64 {
        let mut sum = 0.0;
        for (&d, &m) in data.iter().zip(model) {
            if m <= 0.0 && d > 0.0 {
                return f64::INFINITY;
            }
            sum += m - d;
            if d > 0.0 {
                sum += d * (d / m.max(TINY)).ln();
            }
        }
        2.0 * sum
    }

    fn residuals(&self, _data: &[f64], _model: &[f64], _staterror: Option<&[f64]>) -> Option<Vec<f64>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi2_uses_given_errors() {
        let stat = Chi2.calc_stat(&[1.0, 2.0], &[0.0, 0.0], Some(&[1.0, 2.0]));
        assert!((stat - 2.0).abs() < 1e-12);
    }

    #[test]
    fn chi2_falls_back_to_data_variance() {
        // sqrt(max(|4|,1)) = 2 -> ((4-2)/2)^2 = 1; |0.5| floors to 1 -> 0.25
        let stat = Chi2.calc_stat(&[4.0, 0.5], &[2.0, 0.0], None);
        assert!((stat - 1.25).abs() < 1e-12);
    }

    #[test]
    fn cstat_is_zero_for_perfect_model() {
        let data = [3.0, 0.0, 7.0];
        assert!(CStat.calc_stat(&data, &data, None).abs() < 1e-12);
    }

    #[test]
    fn cash_rejects_zero_model_with_counts() {
        assert!(Cash.calc_stat(&[1.0], &[0.0], None).is_infinite());
    }

    #[test]
    fn capability_flags() {
        assert!(Chi2.has_staterror() && Chi2.supports_confidence() && !Chi2.is_likelihood());
        assert!(!LeastSq.supports_confidence() && !LeastSq.has_staterror());
        assert!(Cash.is_likelihood() && !Cash.has_staterror());
        assert!(CStat.is_likelihood() && CStat.supports_confidence());
        assert!(Cash.residuals(&[1.0], &[1.0], None).is_none());
    }
}
