//! Numerical utilities: point spacing, least-squares solves and finite
//! differences.

pub mod deriv;
pub mod ols;
pub mod spacing;

pub use deriv::*;
pub use ols::*;
pub use spacing::*;
