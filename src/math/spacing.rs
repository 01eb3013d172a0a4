//! Evenly spaced point sequences.

/// `steps` evenly spaced points from `min` to `max`, both endpoints included.
///
/// `steps == 1` yields `[min]`, matching the usual linspace convention.
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
            // Pin the last point so rounding never overshoots `max`.
            out[steps - 1] = max;
            out
        }
    }
}

/// Points `min, min + delv, ...` up to and including `max`.
///
/// A single-precision epsilon of slack keeps a final point that lands on
/// `max` up to rounding; points never exceed `max`. Callers validate
/// `delv > 0` and `min <= max`, and bound the point count with
/// [`arange_len`].
pub fn arange_inclusive(min: f64, max: f64, delv: f64) -> Vec<f64> {
    let count = arange_len(min, max, delv) as usize;
    (0..count).map(|i| (min + delv * i as f64).min(max)).collect()
}

/// Number of points [`arange_inclusive`] yields, as `f64` so that huge or
/// non-finite counts can be rejected before allocating.
pub fn arange_len(min: f64, max: f64, delv: f64) -> f64 {
    let eps = f64::from(f32::EPSILON);
    ((max - min) / delv + eps).floor().max(0.0) + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(3.0, 7.0, 5);
        assert_eq!(v, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn arange_keeps_final_point_despite_rounding() {
        let v = arange_inclusive(0.0, 0.3, 0.1);
        assert_eq!(v.len(), 4);
        assert!((v[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn arange_len_does_not_overflow_on_tiny_steps() {
        assert_eq!(arange_len(0.0, 0.3, 0.1), 4.0);
        let huge = arange_len(0.0, 1.0, 1e-320);
        assert!(huge.is_infinite() || huge > 1e300);
    }

    #[test]
    fn arange_stops_before_overshoot() {
        let v = arange_inclusive(0.0, 1.0, 0.4);
        assert_eq!(v.len(), 3);
        assert!((v[2] - 0.8).abs() < 1e-12);
    }
}
