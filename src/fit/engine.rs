//! Low-level fitting routines for a single measurement series.
//!
//! Given sizes `k_i` and elapsed times `y_i` we solve:
//! - a one-column OLS problem for a theory feature (optionally with intercept)
//! - a five-column OLS problem for the generic polynomial basis
//! - a two-column OLS problem in log-log space for the power law
//!
//! All three go through the same SVD solver; the only difference is how the
//! design matrix is assembled.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FeatureKind, LinearFit, PowerLawFit, ZeroVariancePolicy};
use crate::error::AppError;
use crate::math::{r_squared, solve_least_squares};
use crate::models::{GENERIC_FEATURES, feature_value, predict_feature, predict_generic};

/// Fewest strictly positive points the power-law fit will accept.
const MIN_POWER_LAW_POINTS: usize = 3;

/// Fit `y ≈ a · f(k)` (or `a · f(k) + b` with an intercept).
pub fn fit_feature(
    kind: FeatureKind,
    k: &[f64],
    y: &[f64],
    with_intercept: bool,
    policy: ZeroVariancePolicy,
) -> Result<LinearFit, AppError> {
    ensure_aligned(k, y)?;
    if k.is_empty() {
        return Err(AppError::new(3, "No data points to fit."));
    }

    let n = k.len();
    let p = if with_intercept { 2 } else { 1 };
    if n < p {
        return Err(AppError::new(
            4,
            format!("Underdetermined fit: {n} points for {p} unknowns."),
        ));
    }

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut yv = DVector::<f64>::zeros(n);
    for i in 0..n {
        x[(i, 0)] = feature_value(kind, k[i]);
        if with_intercept {
            x[(i, 1)] = 1.0;
        }
        yv[i] = y[i];
    }

    let beta = solve_least_squares(&x, &yv).ok_or_else(|| {
        AppError::new(
            4,
            format!("Singular design matrix for feature {}.", kind.label()),
        )
    })?;

    let slope = beta[0];
    let intercept = with_intercept.then(|| beta[1]);
    let predictions: Vec<f64> = k
        .iter()
        .map(|&ki| predict_feature(kind, slope, intercept, ki))
        .collect();
    let goodness = r_squared(y, &predictions, policy);

    Ok(LinearFit {
        coefficients: vec![slope],
        intercept,
        goodness,
        predictions,
    })
}

/// Fit the free-form polynomial basis (`GENERIC_FEATURES` columns).
pub fn fit_generic(
    k: &[f64],
    y: &[f64],
    with_intercept: bool,
    policy: ZeroVariancePolicy,
) -> Result<LinearFit, AppError> {
    ensure_aligned(k, y)?;
    if k.is_empty() {
        return Err(AppError::new(3, "No data points to fit."));
    }

    let n = k.len();
    let n_features = GENERIC_FEATURES.len();
    let p = n_features + usize::from(with_intercept);
    if n < p {
        return Err(AppError::new(
            4,
            format!("Underdetermined fit: {n} points for {p} unknowns."),
        ));
    }

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut yv = DVector::<f64>::zeros(n);
    for i in 0..n {
        for (j, kind) in GENERIC_FEATURES.iter().enumerate() {
            x[(i, j)] = feature_value(*kind, k[i]);
        }
        if with_intercept {
            x[(i, n_features)] = 1.0;
        }
        yv[i] = y[i];
    }

    let beta = solve_least_squares(&x, &yv)
        .ok_or_else(|| AppError::new(4, "Singular design matrix for polynomial basis."))?;

    let coefficients: Vec<f64> = beta.iter().copied().take(n_features).collect();
    let intercept = with_intercept.then(|| beta[n_features]);
    let predictions: Vec<f64> = k
        .iter()
        .map(|&ki| predict_generic(&coefficients, intercept, ki))
        .collect();
    let goodness = r_squared(y, &predictions, policy);

    Ok(LinearFit {
        coefficients,
        intercept,
        goodness,
        predictions,
    })
}

/// Fit `y ≈ A · k^p` by regressing `ln y` on `ln k`.
///
/// Rows with non-positive k or y cannot enter log space and are masked out.
/// Fewer than [`MIN_POWER_LAW_POINTS`] surviving rows yields `Ok(None)`: the
/// fit is unavailable, which is not a failure. A solver breakdown on enough
/// rows is an `Err`.
///
/// R² is computed in linear space on the masked rows, so it is comparable
/// with the linear fits' R² on the same group.
pub fn fit_power_law(
    k: &[f64],
    y: &[f64],
    policy: ZeroVariancePolicy,
) -> Result<Option<PowerLawFit>, AppError> {
    ensure_aligned(k, y)?;

    let mut k_used = Vec::new();
    let mut y_used = Vec::new();
    for (&ki, &yi) in k.iter().zip(y.iter()) {
        if ki > 0.0 && yi > 0.0 && ki.is_finite() && yi.is_finite() {
            k_used.push(ki);
            y_used.push(yi);
        }
    }

    let n = k_used.len();
    if n < MIN_POWER_LAW_POINTS {
        return Ok(None);
    }

    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut yv = DVector::<f64>::zeros(n);
    for i in 0..n {
        x[(i, 0)] = k_used[i].ln();
        x[(i, 1)] = 1.0;
        yv[i] = y_used[i].ln();
    }

    let beta = solve_least_squares(&x, &yv)
        .ok_or_else(|| AppError::new(4, "Singular design matrix for power-law fit."))?;

    let exponent = beta[0];
    let amplitude = beta[1].exp();
    if !(exponent.is_finite() && amplitude.is_finite()) {
        return Err(AppError::new(4, "Power-law fit produced non-finite parameters."));
    }

    let predictions: Vec<f64> = k_used.iter().map(|&ki| amplitude * ki.powf(exponent)).collect();
    let goodness = r_squared(&y_used, &predictions, policy);

    Ok(Some(PowerLawFit {
        amplitude,
        exponent,
        goodness,
        n_used: n,
    }))
}

fn ensure_aligned(k: &[f64], y: &[f64]) -> Result<(), AppError> {
    if k.len() != y.len() {
        return Err(AppError::new(4, "Size/time vectors have mismatched lengths."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: ZeroVariancePolicy = ZeroVariancePolicy::Perfect;

    #[test]
    fn recovers_slope_on_perfect_linear_data() {
        let k = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = k.iter().map(|ki| 3.0 * ki).collect();

        let fit = fit_feature(FeatureKind::Linear, &k, &y, false, POLICY).unwrap();
        assert!((fit.coefficients[0] - 3.0).abs() < 1e-9);
        assert!(fit.intercept.is_none());
        assert!((fit.goodness.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recovers_slope_and_intercept() {
        let k = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = k.iter().map(|ki| 2.0 + 3.0 * ki).collect();

        let fit = fit_feature(FeatureKind::Linear, &k, &y, true, POLICY).unwrap();
        assert!((fit.coefficients[0] - 3.0).abs() < 1e-9);
        assert!((fit.intercept.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn no_intercept_fit_passes_through_origin() {
        // Offset data fitted without an intercept: whatever slope comes out,
        // the fitted line must still hit zero at feature value zero.
        let k = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = k.iter().map(|ki| 5.0 + 3.0 * ki).collect();

        let fit = fit_feature(FeatureKind::Linear, &k, &y, false, POLICY).unwrap();
        let at_zero = crate::models::predict_feature(
            FeatureKind::Linear,
            fit.coefficients[0],
            fit.intercept,
            0.0,
        );
        assert_eq!(at_zero, 0.0);
    }

    #[test]
    fn r_squared_bounded_above_by_one_on_noisy_data() {
        let k = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [3.1, 5.8, 9.3, 11.9, 15.2, 17.8];

        let fit = fit_feature(FeatureKind::Linear, &k, &y, true, POLICY).unwrap();
        assert!(fit.goodness.r_squared <= 1.0);
        assert!(fit.goodness.r_squared > 0.9);
    }

    #[test]
    fn empty_input_is_exit_3() {
        let err = fit_feature(FeatureKind::Linear, &[], &[], false, POLICY).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn underdetermined_is_exit_4_not_default_zero() {
        let err = fit_feature(FeatureKind::Linear, &[2.0], &[4.0], true, POLICY).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn generic_fit_reproduces_quadratic_data() {
        let k: Vec<f64> = (1..=8).map(|i| i as f64).collect();
        let y: Vec<f64> = k.iter().map(|ki| 5.0 * ki * ki).collect();

        let fit = fit_generic(&k, &y, true, POLICY).unwrap();
        assert_eq!(fit.coefficients.len(), GENERIC_FEATURES.len());
        assert!(fit.goodness.r_squared > 0.999);
    }

    #[test]
    fn generic_fit_requires_enough_rows() {
        let k = [1.0, 2.0, 3.0];
        let y = [1.0, 4.0, 9.0];
        let err = fit_generic(&k, &y, true, POLICY).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn generic_fit_is_never_worse_than_the_single_feature_fit() {
        // Offset quadratic data: the through-origin k^2 fit cannot absorb the
        // offset, the wider basis (with intercept) can.
        let k: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = k.iter().map(|ki| 4.0 * ki * ki + 50.0).collect();

        let theory = fit_feature(FeatureKind::Quadratic, &k, &y, false, POLICY).unwrap();
        let generic = fit_generic(&k, &y, true, POLICY).unwrap();

        assert!(generic.goodness.r_squared >= theory.goodness.r_squared);
        assert!(generic.goodness.r_squared > 0.999);
    }

    #[test]
    fn power_law_recovers_amplitude_and_exponent() {
        let k = [1.0, 2.0, 4.0, 8.0, 16.0];
        let y: Vec<f64> = k.iter().map(|ki| 5.0 * ki * ki).collect();

        let fit = fit_power_law(&k, &y, POLICY).unwrap().unwrap();
        assert!((fit.amplitude - 5.0).abs() < 1e-6);
        assert!((fit.exponent - 2.0).abs() < 1e-9);
        assert!((fit.goodness.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(fit.n_used, 5);
    }

    #[test]
    fn power_law_masks_non_positive_rows() {
        let k = [0.0, 2.0, 4.0, 8.0];
        let y = [100.0, 20.0, 80.0, 320.0];

        let fit = fit_power_law(&k, &y, POLICY).unwrap().unwrap();
        // The k = 0 row cannot enter log space.
        assert_eq!(fit.n_used, 3);
    }

    #[test]
    fn power_law_absent_below_three_positive_rows() {
        let k = [0.0, -1.0, 5.0];
        let y = [10.0, 10.0, 10.0];
        assert!(fit_power_law(&k, &y, POLICY).unwrap().is_none());

        let k = [1.0, 2.0, 3.0];
        let y = [0.0, 0.0, 7.0];
        assert!(fit_power_law(&k, &y, POLICY).unwrap().is_none());
    }
}
