//! One-parameter confidence intervals.
//!
//! [`IntervalProjection`] re-fits the other free parameters at every grid
//! point; [`IntervalUncertainty`] holds them at their best-fit values.

use crate::error::Result;
use crate::fit::Fit;
use crate::scan::engine::{execute, prepare};
use crate::scan::result::STAT_LABEL;
use crate::scan::{IntervalOptions, IntervalResult, ScanMode, Steps};

fn calc_interval<F: Fit>(
    fit: &mut F,
    par: &str,
    opts: &IntervalOptions,
    mode: ScanMode,
    title: &str,
    context: &'static str,
) -> Result<IntervalResult> {
    let req = opts.grid_request()?;
    let plan = prepare(fit, [par], mode, context, &req, opts.fast)?;
    let y = execute(fit, &plan, opts.numcores)?;

    let axis = &plan.grid.axes[0];
    let [label] = plan.labels;
    Ok(IntervalResult {
        title: title.to_string(),
        xlabel: label,
        ylabel: STAT_LABEL.to_string(),
        x: axis.linear_values(),
        y,
        min: axis.min,
        max: axis.max,
        nloop: axis.len(),
        delv: match req.steps[0] {
            Steps::Spacing(delv) => Some(delv),
            Steps::Count(_) => None,
        },
        fac: opts.fac,
        log: axis.log,
        stat: plan.stat,
        parval: plan.parvals[0],
        diagnostics: plan.diagnostics,
    })
}

/// Statistic profile along one parameter with the others re-fitted.
#[derive(Debug, Clone, Default)]
pub struct IntervalProjection {
    pub options: IntervalOptions,
    result: Option<IntervalResult>,
}

impl IntervalProjection {
    pub fn new(options: IntervalOptions) -> Self {
        Self { options, result: None }
    }

    /// The last successful scan.
    pub fn result(&self) -> Option<&IntervalResult> {
        self.result.as_ref()
    }

    /// Scan `par`. On error the previous result is kept.
    pub fn calc<F: Fit>(&mut self, fit: &mut F, par: &str) -> Result<&IntervalResult> {
        let result = calc_interval(
            fit,
            par,
            &self.options,
            ScanMode::Projection,
            "Interval-Projection",
            "interval projection",
        )?;
        Ok(&*self.result.insert(result))
    }
}

/// Statistic along one parameter with every other parameter held fixed.
#[derive(Debug, Clone, Default)]
pub struct IntervalUncertainty {
    pub options: IntervalOptions,
    result: Option<IntervalResult>,
}

impl IntervalUncertainty {
    pub fn new(options: IntervalOptions) -> Self {
        Self { options, result: None }
    }

    pub fn result(&self) -> Option<&IntervalResult> {
        self.result.as_ref()
    }

    /// Scan `par`. On error the previous result is kept.
    pub fn calc<F: Fit>(&mut self, fit: &mut F, par: &str) -> Result<&IntervalResult> {
        let result = calc_interval(
            fit,
            par,
            &self.options,
            ScanMode::Uncertainty,
            "Interval-Uncertainty",
            "interval uncertainty",
        )?;
        Ok(&*self.result.insert(result))
    }
}
