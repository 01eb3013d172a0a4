//! Domain types used throughout the scan engine.
//!
//! This module defines:
//!
//! - model parameters and their freeze/thaw state (`Parameter`)
//! - optimizer / error-estimator identifiers (`OptMethod`, `EstMethod`)
//! - fit outputs (`FitResult`, `ErrorEstimate`)
//! - scalar-or-list option values (`AxisValue`)
//! - the structured advisory channel (`Diagnostics`)

pub mod diagnostics;
pub mod types;

pub use diagnostics::*;
pub use types::*;
