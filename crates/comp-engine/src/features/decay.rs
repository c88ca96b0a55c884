//! Monotonic decay curves shared by the feature groups.
//!
//! Every curve returns a factor in `[0, 1]`: `1.0` at zero difference and
//! non-increasing as the difference grows.

/// Full credit inside `tolerance`, exponential fall-off beyond it.
pub(crate) fn tolerant_decay(delta: f64, tolerance: f64, scale: f64) -> f64 {
    let delta = delta.abs();
    if !delta.is_finite() {
        return 0.0;
    }
    if delta <= tolerance {
        return 1.0;
    }
    if scale <= 0.0 {
        return 0.0;
    }
    (-(delta - tolerance) / scale).exp()
}

/// Quadratic fall-off reaching exactly zero at `radius`.
pub(crate) fn radial_decay(distance: f64, radius: f64) -> f64 {
    if !distance.is_finite() || radius <= 0.0 {
        return 0.0;
    }
    let remaining = (1.0 - distance.abs() / radius).max(0.0);
    remaining * remaining
}

/// Gaussian bell centred on zero difference.
pub(crate) fn bell_decay(delta: f64, width: f64) -> f64 {
    if !delta.is_finite() || width <= 0.0 {
        return 0.0;
    }
    let ratio = delta / width;
    (-(ratio * ratio)).exp()
}

/// Relative gap between two positive magnitudes: `1 - min/max`.
pub(crate) fn ratio_gap(a: f64, b: f64) -> Option<f64> {
    if a <= 0.0 || b <= 0.0 || !a.is_finite() || !b.is_finite() {
        return None;
    }
    Some(1.0 - a.min(b) / a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_decay_is_flat_inside_band_then_falls() {
        assert_eq!(tolerant_decay(0.05, 0.1, 0.2), 1.0);
        assert_eq!(tolerant_decay(-0.1, 0.1, 0.2), 1.0);
        let near = tolerant_decay(0.2, 0.1, 0.2);
        let far = tolerant_decay(0.6, 0.1, 0.2);
        assert!(near < 1.0 && far < near && far > 0.0);
    }

    #[test]
    fn radial_decay_hits_bounds() {
        assert_eq!(radial_decay(0.0, 5.0), 1.0);
        assert_eq!(radial_decay(5.0, 5.0), 0.0);
        assert_eq!(radial_decay(12.0, 5.0), 0.0);
        assert!((radial_decay(2.5, 5.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn bell_decay_is_symmetric() {
        assert_eq!(bell_decay(0.0, 0.25), 1.0);
        assert_eq!(bell_decay(0.1, 0.25), bell_decay(-0.1, 0.25));
    }

    #[test]
    fn ratio_gap_rejects_non_positive() {
        assert_eq!(ratio_gap(0.0, 10.0), None);
        assert_eq!(ratio_gap(1_000.0, 1_000.0), Some(0.0));
        assert!((ratio_gap(800.0, 1_000.0).unwrap() - 0.2).abs() < 1e-12);
    }
}
