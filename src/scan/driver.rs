//! Parallel evaluation of a grid.
//!
//! Every rayon worker owns a private clone of the prepared fit. Before each
//! point the clone is reset from the template, so a point's value never
//! depends on which worker ran it or what that worker ran before. The
//! caller's fit is only read.
//!
//! Results come back in input order. The first failing point stops the
//! remaining work and its error is returned.

use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::error::{ConfidenceError, FitError, Result};
use crate::fit::Fit;
use crate::scan::Evaluator;

/// Apply `f` to every item on a private, freshly reset copy of `template`.
///
/// `numcores = Some(n)` with `n > 0` runs on a dedicated pool of `n`
/// threads; otherwise the global rayon pool is used.
pub fn parallel_map<S, T, R, E, G>(template: &S, items: &[T], numcores: Option<usize>, f: G) -> Result<Vec<R>>
where
    S: Clone + Send + Sync,
    T: Sync,
    R: Send,
    E: Send,
    ConfidenceError: From<E>,
    G: Fn(&mut S, &T) -> std::result::Result<R, E> + Send + Sync,
{
    let run = || {
        items
            .par_iter()
            .map_init(
                || template.clone(),
                |local, item| {
                    local.clone_from(template);
                    f(local, item)
                },
            )
            .collect::<std::result::Result<Vec<R>, E>>()
    };

    let out = match numcores {
        Some(n) if n > 0 => ThreadPoolBuilder::new().num_threads(n).build()?.install(run),
        _ => run(),
    };
    Ok(out?)
}

/// Evaluate the statistic at every point of the grid, in grid order.
pub fn run_scan<F: Fit, const N: usize>(
    fit: &F,
    evaluator: &Evaluator<'_, N>,
    points: &[[f64; N]],
    numcores: Option<usize>,
) -> Result<Vec<f64>> {
    let started = Instant::now();
    let y = parallel_map(fit, points, numcores, |local: &mut F, p| -> std::result::Result<f64, FitError> {
        evaluator.eval(local, *p)
    })?;
    debug!(
        points = y.len(),
        workers = numcores.filter(|&n| n > 0).unwrap_or_else(rayon::current_num_threads),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "grid evaluated"
    );
    Ok(y)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::scan::{build_grid, GridRequest, ScanMode, Steps};
    use crate::test_utils::QuadraticFit;

    #[test]
    fn output_follows_input_order() {
        let items: Vec<u64> = (0..200).collect();
        let out = parallel_map(&0u8, &items, Some(4), |_, &i| -> std::result::Result<u64, FitError> {
            std::thread::sleep(Duration::from_micros((200 - i) * 5));
            Ok(i * i)
        })
        .unwrap();
        assert_eq!(out, items.iter().map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn every_item_starts_from_the_template() {
        let items: Vec<usize> = (0..64).collect();
        let out = parallel_map(&vec![1usize], &items, Some(3), |local, &i| -> std::result::Result<usize, FitError> {
            local.push(i);
            Ok(local.len())
        })
        .unwrap();
        assert!(out.iter().all(|&n| n == 2));
    }

    #[test]
    fn first_error_is_returned() {
        let calls = AtomicUsize::new(0);
        let items: Vec<usize> = (0..10).collect();
        let err = parallel_map(&(), &items, Some(1), |_, &i| {
            calls.fetch_add(1, Ordering::SeqCst);
            if i == 3 {
                Err(FitError::NonFiniteStat { value: f64::NAN })
            } else {
                Ok(i)
            }
        })
        .unwrap_err();
        assert!(matches!(err, ConfidenceError::Fit(FitError::NonFiniteStat { .. })));
        assert!(calls.load(Ordering::SeqCst) <= items.len());
    }

    #[test]
    fn scan_matches_sequential_evaluation() {
        let mut fit = QuadraticFit::new(&[("q.a", 2.0)]);
        let req = GridRequest {
            min: Some([0.0]),
            max: Some([4.0]),
            steps: [Steps::Count(9)],
            fac: 1.0,
            log: [false],
        };
        let grid = build_grid(&mut fit, [0], &req).unwrap();
        fit.pars[0].freeze();
        fit.jitter = Some(Duration::from_micros(300));
        let eval = Evaluator::new(&grid, [0], ScanMode::Uncertainty, 1);

        let points = grid.points();
        let serial = run_scan(&fit, &eval, &points, Some(1)).unwrap();
        let parallel = run_scan(&fit, &eval, &points, Some(4)).unwrap();
        let global = run_scan(&fit, &eval, &points, None).unwrap();

        let expected: Vec<f64> = points.iter().map(|p| (p[0] - 2.0).powi(2)).collect();
        assert_eq!(serial, expected);
        assert_eq!(parallel, expected);
        assert_eq!(global, expected);
        assert_eq!(fit.pars[0].val, 2.0);
    }
}
