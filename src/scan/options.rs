//! Per-scan options, loadable from JSON.
//!
//! Bounds and step counts accept either a scalar or a list, so a document
//! with the wrong shape still parses and the scan reports what is wrong with
//! it.

use serde::{Deserialize, Serialize};

use crate::domain::AxisValue;
use crate::error::{ConfidenceError, Result};
use crate::scan::{GridRequest, Steps};

/// Options for one-parameter interval scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalOptions {
    /// Lower bound; derived from a covariance estimate when unset.
    pub min: Option<AxisValue<f64>>,
    pub max: Option<AxisValue<f64>>,
    /// Number of grid points (ignored when `delv` is set).
    pub nloop: AxisValue<usize>,
    /// Grid spacing.
    pub delv: Option<f64>,
    /// Widening factor for derived bounds.
    pub fac: f64,
    pub log: bool,
    /// Worker threads; `None` uses every core.
    pub numcores: Option<usize>,
    /// Projection only: switch to the optimizer suited to the statistic.
    pub fast: bool,
}

impl Default for IntervalOptions {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            nloop: AxisValue::One(20),
            delv: None,
            fac: 1.0,
            log: false,
            numcores: None,
            fast: true,
        }
    }
}

impl IntervalOptions {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub(crate) fn grid_request(&self) -> Result<GridRequest<1>> {
        let scalar = |v: &Option<AxisValue<f64>>| -> Result<Option<[f64; 1]>> {
            v.as_ref()
                .map(|v| {
                    v.scalar()
                        .map(|x| [x])
                        .ok_or(ConfidenceError::NonScalarBounds { expected: "scalars" })
                })
                .transpose()
        };
        let min = scalar(&self.min)?;
        let max = scalar(&self.max)?;
        let steps = match self.delv {
            Some(delv) => Steps::Spacing(delv),
            None => Steps::Count(
                self.nloop
                    .scalar()
                    .ok_or(ConfidenceError::InsufficientSteps { expected: "a scalar > 1" })?,
            ),
        };
        Ok(GridRequest {
            min,
            max,
            steps: [steps],
            fac: self.fac,
            log: [self.log],
        })
    }
}

/// Options for two-parameter region scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionOptions {
    pub min: Option<AxisValue<f64>>,
    pub max: Option<AxisValue<f64>>,
    pub nloop: AxisValue<usize>,
    pub delv: Option<[f64; 2]>,
    pub fac: f64,
    pub log: [bool; 2],
    /// Confidence multipliers turned into contour levels.
    pub sigma: Option<AxisValue<f64>>,
    /// Explicit contour levels; take precedence over `sigma`.
    pub levels: Option<Vec<f64>>,
    pub numcores: Option<usize>,
    pub fast: bool,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            nloop: AxisValue::pair(10, 10),
            delv: None,
            fac: 4.0,
            log: [false, false],
            sigma: Some(AxisValue::Many(vec![1.0, 2.0, 3.0])),
            levels: None,
            numcores: None,
            fast: true,
        }
    }
}

impl RegionOptions {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub(crate) fn grid_request(&self) -> Result<GridRequest<2>> {
        let pair = |v: &Option<AxisValue<f64>>| -> Result<Option<[f64; 2]>> {
            v.as_ref()
                .map(|v| {
                    v.array::<2>()
                        .ok_or(ConfidenceError::NonScalarBounds { expected: "a list" })
                })
                .transpose()
        };
        let min = pair(&self.min)?;
        let max = pair(&self.max)?;
        let steps = match self.delv {
            Some([d0, d1]) => [Steps::Spacing(d0), Steps::Spacing(d1)],
            None => {
                let [n0, n1] = self.nloop.array::<2>().ok_or(ConfidenceError::InsufficientSteps {
                    expected: "a list with elements > 1",
                })?;
                [Steps::Count(n0), Steps::Count(n1)]
            }
        };
        Ok(GridRequest {
            min,
            max,
            steps,
            fac: self.fac,
            log: self.log,
        })
    }
}
