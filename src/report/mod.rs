//! Residual displays and result formatting.
//!
//! The displays compare a [`DataFit`]'s data with its current model values.
//! They prepare arrays for a plotting layer and never draw anything.
//!
//! Per-point errors come from the data when it has them, otherwise from the
//! statistic's own estimate. Statistics without per-point errors get an
//! advisory for `resid`/`ratio` and a [`StatError::BadStat`] for
//! `delchi`/`chisqr`.

pub mod format;

use serde::{Deserialize, Serialize};

use crate::domain::{DiagnosticKind, Diagnostics};
use crate::error::StatError;
use crate::fit::{DataFit, Fit};

/// A 1-D residual-style curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualDisplay {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yerr: Option<Vec<f64>>,
    pub diagnostics: Diagnostics,
}

fn missing_errors(fit: &DataFit, diagnostics: &mut Diagnostics) {
    diagnostics.warn(
        DiagnosticKind::MissingStatErrors,
        format!(
            "unable to calculate errors using current statistic: {}",
            fit.stat().name()
        ),
    );
}

/// Per-point errors, or `None` when the statistic has none.
fn point_errors(fit: &DataFit) -> Option<Vec<f64>> {
    fit.stat()
        .has_staterror()
        .then(|| fit.effective_staterror())
        .flatten()
}

/// `data - model`.
pub fn resid(fit: &DataFit) -> ResidualDisplay {
    let data = fit.data();
    let model = fit.model_values();
    let mut diagnostics = Diagnostics::new();

    let yerr = point_errors(fit);
    if yerr.is_none() {
        missing_errors(fit, &mut diagnostics);
    }

    ResidualDisplay {
        title: format!("Residuals of {} - Model", data.name),
        xlabel: "x".to_string(),
        ylabel: "y".to_string(),
        x: data.x.clone(),
        y: data.y.iter().zip(&model).map(|(d, m)| d - m).collect(),
        yerr,
        diagnostics,
    }
}

/// `data / model`; points where the model is zero show as zero.
pub fn ratio(fit: &DataFit) -> ResidualDisplay {
    let data = fit.data();
    let raw = fit.model_values();
    let model: Vec<f64> = raw.iter().map(|&m| if m == 0.0 { 1.0 } else { m }).collect();
    let mut diagnostics = Diagnostics::new();

    let y = data
        .y
        .iter()
        .zip(&raw)
        .zip(&model)
        .map(|((&d, &r), &m)| if r == 0.0 { 0.0 } else { d / m })
        .collect();

    let yerr = point_errors(fit).map(|err| err.iter().zip(&model).map(|(e, m)| e / m).collect());
    if yerr.is_none() {
        missing_errors(fit, &mut diagnostics);
    }

    ResidualDisplay {
        title: format!("Ratio of {} : Model", data.name),
        xlabel: "x".to_string(),
        ylabel: "Data / Model".to_string(),
        x: data.x.clone(),
        y,
        yerr,
        diagnostics,
    }
}

/// `(data - model) / error`, with unit error bars.
pub fn delchi(fit: &DataFit) -> Result<ResidualDisplay, StatError> {
    let data = fit.data();
    let err = match &data.staterror {
        Some(err) => err.clone(),
        None => point_errors(fit).ok_or(StatError::BadStat {
            display: "delchi",
            stat: fit.stat().name(),
        })?,
    };
    let model = fit.model_values();

    Ok(ResidualDisplay {
        title: format!("Sigma Residuals of {}", data.name),
        xlabel: "x".to_string(),
        ylabel: "Sigma".to_string(),
        x: data.x.clone(),
        y: data
            .y
            .iter()
            .zip(&model)
            .zip(&err)
            .map(|((d, m), e)| (d - m) / e)
            .collect(),
        yerr: Some(vec![1.0; err.len()]),
        diagnostics: Diagnostics::new(),
    })
}

/// `((data - model) / error)²`.
pub fn chisqr(fit: &DataFit) -> Result<ResidualDisplay, StatError> {
    let data = fit.data();
    let err = point_errors(fit).ok_or(StatError::BadStat {
        display: "chisqr",
        stat: fit.stat().name(),
    })?;
    let model = fit.model_values();

    Ok(ResidualDisplay {
        title: format!("chi^2 of {}", data.name),
        xlabel: "x".to_string(),
        ylabel: "chi^2".to_string(),
        x: data.x.clone(),
        y: data
            .y
            .iter()
            .zip(&model)
            .zip(&err)
            .map(|((d, m), e)| ((d - m) / e).powi(2))
            .collect(),
        yerr: None,
        diagnostics: Diagnostics::new(),
    })
}
