//! Least squares solver and goodness-of-fit.
//!
//! Every model in this project is linear in its coefficients once the size
//! column has been pushed through a feature transform, so a single solver
//! covers the theory fits, the generic polynomial, and the log-log power law.
//!
//! Implementation choices:
//! - SVD rather than normal equations. Polynomial feature columns (`k`, `k^2`,
//!   `k^2 log k`) become nearly collinear as k grows, and squaring the design
//!   matrix would throw away half the precision.
//! - Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   tall matrices, which ours always are.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Goodness, ZeroVariancePolicy};

/// Variance below this is treated as "no variance" for R² purposes.
const SS_TOT_EPS: f64 = 1e-9;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// When the observed values are (numerically) constant, `SS_tot ≈ 0` and the
/// ratio is undefined; the configured policy decides the reported value and
/// the result is flagged so consumers can tell it was conventional.
pub fn r_squared(observed: &[f64], predicted: &[f64], policy: ZeroVariancePolicy) -> Goodness {
    debug_assert_eq!(observed.len(), predicted.len());

    let n = observed.len();
    if n == 0 {
        return Goodness {
            r_squared: policy.conventional_value(),
            zero_variance: true,
        };
    }

    let mean = observed.iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&obs, &pred) in observed.iter().zip(predicted.iter()) {
        let r = obs - pred;
        ss_res += r * r;
        let d = obs - mean;
        ss_tot += d * d;
    }

    if ss_tot <= SS_TOT_EPS {
        return Goodness {
            r_squared: policy.conventional_value(),
            zero_variance: true,
        };
    }

    Goodness {
        r_squared: 1.0 - ss_res / ss_tot,
        zero_variance: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn r_squared_perfect_fit_is_one() {
        let obs = [1.0, 2.0, 3.0, 4.0];
        let g = r_squared(&obs, &obs, ZeroVariancePolicy::Perfect);
        assert!((g.r_squared - 1.0).abs() < 1e-12);
        assert!(!g.zero_variance);
    }

    #[test]
    fn r_squared_never_exceeds_one() {
        let obs = [1.0, 2.0, 3.0, 4.0];
        let pred = [1.5, 1.5, 3.5, 3.5];
        let g = r_squared(&obs, &pred, ZeroVariancePolicy::Perfect);
        assert!(g.r_squared <= 1.0);
    }

    #[test]
    fn r_squared_can_go_negative_for_bad_fits() {
        // A constant prediction far from the data explains less than the mean.
        let obs = [1.0, 2.0, 3.0];
        let pred = [100.0, 100.0, 100.0];
        let g = r_squared(&obs, &pred, ZeroVariancePolicy::Perfect);
        assert!(g.r_squared < 0.0);
    }

    #[test]
    fn zero_variance_follows_policy_and_is_flagged() {
        let obs = [5.0, 5.0, 5.0];
        let pred = [5.0, 5.0, 5.0];

        let perfect = r_squared(&obs, &pred, ZeroVariancePolicy::Perfect);
        assert!((perfect.r_squared - 1.0).abs() < 1e-12);
        assert!(perfect.zero_variance);

        let zero = r_squared(&obs, &pred, ZeroVariancePolicy::Zero);
        assert!((zero.r_squared - 0.0).abs() < 1e-12);
        assert!(zero.zero_variance);
    }
}
