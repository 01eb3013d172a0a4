//! Confidence interval and region scans.
//!
//! A scan perturbs one or two parameters of a fitted model over a grid and
//! records the statistic at every point:
//!
//! - projection: the remaining free parameters are re-fitted at each point
//! - uncertainty: everything else stays at its best-fit value
//!
//! Pipeline, leaves first:
//!
//! - [`grid`]: bounds (given or derived from a covariance estimate), step
//!   rules, log axes, mesh order
//! - [`levels`]: sigma multipliers to contour levels (regions only)
//! - [`guard`]: scoped freeze/thaw with restoration on every exit path
//! - [`evaluator`]: one grid point to one statistic value
//! - [`driver`]: ordered parallel evaluation on per-worker fit clones
//! - [`interval`] / [`region`]: the four public scans
//!
//! The caller's fit is left exactly as it was found, whether the scan
//! succeeds or fails.

pub mod driver;
mod engine;
pub mod evaluator;
pub mod grid;
pub mod guard;
pub mod interval;
pub mod levels;
pub mod method;
pub mod options;
pub mod region;
pub mod result;

pub use driver::*;
pub use evaluator::*;
pub use grid::*;
pub use guard::*;
pub use interval::*;
pub use levels::*;
pub use method::*;
pub use options::*;
pub use region::*;
pub use result::*;
