//! Two-parameter confidence regions.

use crate::error::Result;
use crate::fit::Fit;
use crate::scan::engine::{execute, prepare};
use crate::scan::{contour_levels, RegionOptions, RegionResult, ScanMode};

fn calc_region<F: Fit>(
    fit: &mut F,
    pars: [&str; 2],
    opts: &RegionOptions,
    mode: ScanMode,
    title: &str,
    context: &'static str,
) -> Result<RegionResult> {
    let req = opts.grid_request()?;
    let plan = prepare(fit, pars, mode, context, &req, opts.fast)?;
    let levels = contour_levels(plan.stat, opts.levels.as_deref(), opts.sigma.as_ref())?;
    let y = execute(fit, &plan, opts.numcores)?;

    let [x0, x1] = plan.grid.linear_columns();
    let [a0, a1] = &plan.grid.axes;
    let [xlabel, ylabel] = plan.labels;
    Ok(RegionResult {
        title: title.to_string(),
        xlabel,
        ylabel,
        x0,
        x1,
        y,
        min: [a0.min, a1.min],
        max: [a0.max, a1.max],
        nloop: [a0.len(), a1.len()],
        delv: opts.delv,
        fac: opts.fac,
        log: [a0.log, a1.log],
        sigma: match (&opts.levels, &opts.sigma) {
            (None, Some(sigma)) => sigma.as_list().map(<[f64]>::to_vec),
            _ => None,
        },
        levels,
        stat: plan.stat,
        parval0: plan.parvals[0],
        parval1: plan.parvals[1],
        diagnostics: plan.diagnostics,
    })
}

/// Statistic surface over two parameters with the others re-fitted.
#[derive(Debug, Clone, Default)]
pub struct RegionProjection {
    pub options: RegionOptions,
    result: Option<RegionResult>,
}

impl RegionProjection {
    pub fn new(options: RegionOptions) -> Self {
        Self { options, result: None }
    }

    pub fn result(&self) -> Option<&RegionResult> {
        self.result.as_ref()
    }

    /// Scan `par0` × `par1`. On error the previous result is kept.
    pub fn calc<F: Fit>(&mut self, fit: &mut F, par0: &str, par1: &str) -> Result<&RegionResult> {
        let result = calc_region(
            fit,
            [par0, par1],
            &self.options,
            ScanMode::Projection,
            "Region-Projection",
            "region projection",
        )?;
        Ok(&*self.result.insert(result))
    }
}

/// Statistic surface over two parameters with every other parameter fixed.
#[derive(Debug, Clone, Default)]
pub struct RegionUncertainty {
    pub options: RegionOptions,
    result: Option<RegionResult>,
}

impl RegionUncertainty {
    pub fn new(options: RegionOptions) -> Self {
        Self { options, result: None }
    }

    pub fn result(&self) -> Option<&RegionResult> {
        self.result.as_ref()
    }

    pub fn calc<F: Fit>(&mut self, fit: &mut F, par0: &str, par1: &str) -> Result<&RegionResult> {
        let result = calc_region(
            fit,
            [par0, par1],
            &self.options,
            ScanMode::Uncertainty,
            "Region-Uncertainty",
            "region uncertainty",
        )?;
        Ok(&*self.result.insert(result))
    }
}
