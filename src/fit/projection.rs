//! Dense prediction curves over a group's observed size range.

use crate::domain::{Curve, FeatureKind};
use crate::models::predict_feature;

/// Sample a fitted feature model on an evenly spaced grid over
/// `[k_min, k_max]`.
///
/// The first and last grid points are set to `k_min` and `k_max` exactly
/// rather than computed from the step, so the curve never under- or
/// over-shoots the observed range. Predictions go through the same
/// [`predict_feature`] path the fit itself used. Fewer than two requested
/// points is rounded up to two; a degenerate range (`k_min == k_max`)
/// yields a flat segment.
pub fn project_curve(
    kind: FeatureKind,
    slope: f64,
    intercept: Option<f64>,
    k_min: f64,
    k_max: f64,
    n_points: usize,
) -> Curve {
    let n = n_points.max(2);
    let span = k_max - k_min;

    let mut k = Vec::with_capacity(n);
    let mut predicted = Vec::with_capacity(n);
    for i in 0..n {
        let ki = if i == 0 {
            k_min
        } else if i == n - 1 {
            k_max
        } else {
            k_min + span * (i as f64 / (n - 1) as f64)
        };
        k.push(ki);
        predicted.push(predict_feature(kind, slope, intercept, ki));
    }

    Curve { k, predicted }
}
