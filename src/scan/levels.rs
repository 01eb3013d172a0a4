//! Sigma multipliers to absolute contour levels for two-parameter regions.

use statrs::function::erf::erfc;

use crate::domain::AxisValue;
use crate::error::{ConfidenceError, Result};

/// Statistic rise enclosing `sigma` for two jointly estimated parameters:
/// `-2 ln(erfc(sigma / √2))`.
pub fn sigma_delta(sigma: f64) -> f64 {
    -2.0 * erfc(sigma / std::f64::consts::SQRT_2).ln()
}

/// Absolute contour levels `stat + delta(sigma)`, in sigma order.
///
/// `sigma` must be a non-empty list; a missing value or a scalar is rejected.
pub fn sigma_levels(stat: f64, sigma: Option<&AxisValue<f64>>) -> Result<Vec<f64>> {
    let sigma = match sigma {
        None => return Err(ConfidenceError::SigmaSpec { reason: "no sigma values given" }),
        Some(AxisValue::One(_)) => {
            return Err(ConfidenceError::SigmaSpec { reason: "a scalar was given" });
        }
        Some(AxisValue::Many(values)) if values.is_empty() => {
            return Err(ConfidenceError::SigmaSpec { reason: "the list is empty" });
        }
        Some(AxisValue::Many(values)) => values,
    };
    Ok(sigma.iter().map(|&s| stat + sigma_delta(s)).collect())
}

/// Explicit `levels` when given, otherwise levels from `sigma`.
pub fn contour_levels(
    stat: f64,
    levels: Option<&[f64]>,
    sigma: Option<&AxisValue<f64>>,
) -> Result<Vec<f64>> {
    match levels {
        Some(levels) => Ok(levels.to_vec()),
        None => sigma_levels(stat, sigma),
    }
}
