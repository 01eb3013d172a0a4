//! Optimizer choice for projection scans.

use crate::domain::{DiagnosticKind, Diagnostics, OptMethod};
use crate::stats::Statistic;

/// Pick the optimizer a projection scan should run with.
///
/// - a method other than Levenberg-Marquardt or Nelder-Mead is reported as
///   inappropriate, whether or not `fast` is set
/// - with `fast`, likelihood statistics get Nelder-Mead and everything else
///   gets Levenberg-Marquardt; a switch is reported
///
/// Returns the method to swap in for the duration of the scan, or `None` to
/// keep the current one.
pub fn select_method(
    current: OptMethod,
    stat: &dyn Statistic,
    fast: bool,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<OptMethod> {
    if !current.suits_confidence() {
        diagnostics.warn(
            DiagnosticKind::InappropriateMethod,
            format!("{} is inappropriate for confidence limit estimation", current.name()),
        );
    }
    if !fast {
        return None;
    }

    let wanted = if stat.is_likelihood() {
        OptMethod::NelderMead
    } else {
        OptMethod::LevMar
    };
    if current == wanted {
        return None;
    }
    diagnostics.warn(
        DiagnosticKind::MethodSwitched,
        format!("Setting optimization to {} for {context}", wanted.name()),
    );
    Some(wanted)
}
