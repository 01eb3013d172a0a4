//! Completed scans, as handed to a plotting layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Diagnostics;
use crate::report::format::{format_array, format_fields, format_list, format_opt};

/// Label of the statistic axis of an interval curve.
pub const STAT_LABEL: &str = "Statistic Value";

/// A one-parameter confidence curve.
///
/// `x` holds the linear parameter values that were evaluated, `y` the
/// statistic at each, index for index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalResult {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Scanned range (linear, after clipping).
    pub min: f64,
    pub max: f64,
    pub nloop: usize,
    pub delv: Option<f64>,
    pub fac: f64,
    pub log: bool,
    /// Statistic at the best fit (horizontal reference line).
    pub stat: f64,
    /// Best-fit value of the parameter (vertical reference line).
    pub parval: f64,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for IntervalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("x", format_array(&self.x)),
            ("y", format_array(&self.y)),
            ("min", self.min.to_string()),
            ("max", self.max.to_string()),
            ("nloop", self.nloop.to_string()),
            ("delv", format_opt(self.delv)),
            ("fac", self.fac.to_string()),
            ("log", self.log.to_string()),
        ];
        f.write_str(&format_fields(&fields))
    }
}

/// A two-parameter confidence surface.
///
/// `x0`, `x1` and `y` are flattened in mesh order with `x0` varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub x0: Vec<f64>,
    pub x1: Vec<f64>,
    pub y: Vec<f64>,
    pub min: [f64; 2],
    pub max: [f64; 2],
    pub nloop: [usize; 2],
    pub delv: Option<[f64; 2]>,
    pub fac: f64,
    pub log: [bool; 2],
    pub sigma: Option<Vec<f64>>,
    /// Absolute contour levels.
    pub levels: Vec<f64>,
    pub stat: f64,
    pub parval0: f64,
    pub parval1: f64,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for RegionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("x0", format_array(&self.x0)),
            ("x1", format_array(&self.x1)),
            ("y", format_array(&self.y)),
            ("min", format_list(&self.min)),
            ("max", format_list(&self.max)),
            ("nloop", format_list(&self.nloop)),
            ("fac", self.fac.to_string()),
            ("delv", format_opt(self.delv.map(|d| format_list(&d)))),
            ("log", format_list(&self.log)),
            ("sigma", format_opt(self.sigma.as_deref().map(format_list))),
            ("parval0", self.parval0.to_string()),
            ("parval1", self.parval1.to_string()),
            ("levels", format_array(&self.levels)),
        ];
        f.write_str(&format_fields(&fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_text_form() {
        let result = IntervalResult {
            title: "Interval-Uncertainty".into(),
            xlabel: "q.a".into(),
            ylabel: STAT_LABEL.into(),
            x: vec![3.0, 4.0, 5.0],
            y: vec![4.0, 1.0, 0.0],
            min: 3.0,
            max: 5.0,
            nloop: 3,
            delv: None,
            fac: 1.0,
            log: false,
            stat: 0.0,
            parval: 5.0,
            diagnostics: Diagnostics::new(),
        };
        let text = result.to_string();
        assert!(text.starts_with("x     = [3.0000 4.0000 5.0000]\n"));
        assert!(text.contains("\ndelv  = None\n"));
        assert!(text.ends_with("log   = false"));
    }

    #[test]
    fn region_text_form_lists_levels() {
        let result = RegionResult {
            title: "Region-Uncertainty".into(),
            xlabel: "q.a".into(),
            ylabel: "q.b".into(),
            x0: vec![0.0, 1.0],
            x1: vec![0.0, 0.0],
            y: vec![1.0, 2.0],
            min: [0.0, 0.0],
            max: [1.0, 1.0],
            nloop: [2, 1],
            delv: None,
            fac: 4.0,
            log: [false, true],
            sigma: Some(vec![1.0, 2.0]),
            levels: vec![2.3, 6.2],
            stat: 0.0,
            parval0: 0.5,
            parval1: 0.5,
            diagnostics: Diagnostics::new(),
        };
        let text = result.to_string();
        assert!(text.contains("log     = [false, true]"));
        assert!(text.contains("sigma   = [1, 2]"));
        assert!(text.ends_with("levels  = [2.3000 6.2000]"));
    }
}
