//! Feature transforms and the theory table.
//!
//! The fitting code relies on three primitive operations:
//! - map a size k through a complexity shape (for design matrices)
//! - look up the expected shape for an (operation, structure) pair
//! - predict time(k) given fitted coefficients (for residuals/curves)
//!
//! Keeping these as small pure functions means the regression engine, the
//! curve projector, and the plots all evaluate models through the same code
//! path and cannot drift apart.

use crate::domain::{FeatureKind, Operation, Structure};

/// Columns of the generic polynomial design matrix, in order.
pub const GENERIC_FEATURES: [FeatureKind; 5] = [
    FeatureKind::Logarithmic,
    FeatureKind::Linear,
    FeatureKind::Linearithmic,
    FeatureKind::Quadratic,
    FeatureKind::QuadraticLog,
];

/// `ln(max(k, 1))`.
///
/// Benchmark logs legitimately contain k = 0 (empty-structure probes), and
/// the linearithmic shapes must stay finite there.
pub fn log_size(k: f64) -> f64 {
    k.max(1.0).ln()
}

/// Evaluate a complexity shape at size k.
pub fn feature_value(kind: FeatureKind, k: f64) -> f64 {
    match kind {
        FeatureKind::Constant => 1.0,
        FeatureKind::Logarithmic => log_size(k),
        FeatureKind::Linear => k,
        FeatureKind::Linearithmic => k * log_size(k),
        FeatureKind::Quadratic => k * k,
        FeatureKind::QuadraticLog => k * k * log_size(k),
    }
}

/// Expected complexity shape for an (operation, structure) pair.
///
/// Pairs outside the table fall back to linear: a stray label in a log should
/// produce a best-guess fit, never abort the batch.
pub fn theoretical_feature(operation: &str, structure: &str) -> FeatureKind {
    let (Some(op), Some(st)) = (Operation::parse(operation), Structure::parse(structure)) else {
        return FeatureKind::Linear;
    };

    match (st, op) {
        (Structure::Hash, Operation::ElementSum)
        | (Structure::Hash, Operation::ScalarMul)
        | (Structure::Hash, Operation::PointSet)
        | (Structure::Hash, Operation::PointGet) => FeatureKind::Linear,
        (Structure::Hash, Operation::MatrixMul) => FeatureKind::Quadratic,
        (Structure::Hash, Operation::Transpose) => FeatureKind::Constant,

        (Structure::Tree, Operation::ElementSum)
        | (Structure::Tree, Operation::PointSet)
        | (Structure::Tree, Operation::PointGet) => FeatureKind::Linearithmic,
        (Structure::Tree, Operation::ScalarMul) => FeatureKind::Linear,
        (Structure::Tree, Operation::MatrixMul) => FeatureKind::QuadraticLog,
        (Structure::Tree, Operation::Transpose) => FeatureKind::Constant,
    }
}

/// Predict `time(k)` for a single-feature fit.
pub fn predict_feature(kind: FeatureKind, slope: f64, intercept: Option<f64>, k: f64) -> f64 {
    slope * feature_value(kind, k) + intercept.unwrap_or(0.0)
}

/// Predict `time(k)` for a generic polynomial fit.
///
/// # Panics
/// Panics if `coefficients` is shorter than `GENERIC_FEATURES`. The engine
/// always produces one coefficient per column.
pub fn predict_generic(coefficients: &[f64], intercept: Option<f64>, k: f64) -> f64 {
    let mut y = intercept.unwrap_or(0.0);
    for (kind, &coef) in GENERIC_FEATURES.iter().zip(coefficients.iter()) {
        y += coef * feature_value(*kind, k);
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_size_is_guarded_at_small_k() {
        assert_eq!(log_size(0.0), 0.0);
        assert_eq!(log_size(1.0), 0.0);
        assert!((log_size(std::f64::consts::E) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn feature_values_match_shapes() {
        let k = 8.0;
        assert_eq!(feature_value(FeatureKind::Constant, k), 1.0);
        assert!((feature_value(FeatureKind::Linear, k) - 8.0).abs() < 1e-12);
        assert!((feature_value(FeatureKind::Linearithmic, k) - 8.0 * 8.0_f64.ln()).abs() < 1e-12);
        assert!((feature_value(FeatureKind::Quadratic, k) - 64.0).abs() < 1e-12);
        assert!(
            (feature_value(FeatureKind::QuadraticLog, k) - 64.0 * 8.0_f64.ln()).abs() < 1e-12
        );
    }

    #[test]
    fn shapes_stay_finite_at_k_zero() {
        for kind in GENERIC_FEATURES {
            assert!(feature_value(kind, 0.0).is_finite());
        }
    }

    #[test]
    fn theory_table_hash() {
        assert_eq!(theoretical_feature("SOMA", "Hash"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("SET", "Hash"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("GET", "Hash"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("ESCALAR", "Hash"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("MULT", "Hash"), FeatureKind::Quadratic);
        assert_eq!(theoretical_feature("TRANS", "Hash"), FeatureKind::Constant);
    }

    #[test]
    fn theory_table_tree() {
        assert_eq!(theoretical_feature("SOMA", "Tree"), FeatureKind::Linearithmic);
        assert_eq!(theoretical_feature("SET", "Tree"), FeatureKind::Linearithmic);
        assert_eq!(theoretical_feature("GET", "Tree"), FeatureKind::Linearithmic);
        assert_eq!(theoretical_feature("ESCALAR", "Tree"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("MULT", "Tree"), FeatureKind::QuadraticLog);
        assert_eq!(theoretical_feature("TRANS", "Tree"), FeatureKind::Constant);
    }

    #[test]
    fn unknown_pairs_fall_back_to_linear() {
        assert_eq!(theoretical_feature("JOIN", "Hash"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("SOMA", "Skiplist"), FeatureKind::Linear);
        assert_eq!(theoretical_feature("", ""), FeatureKind::Linear);
    }

    #[test]
    fn predict_feature_through_origin_when_no_intercept() {
        let y = predict_feature(FeatureKind::Linear, 3.0, None, 0.0);
        assert_eq!(y, 0.0);
        let y = predict_feature(FeatureKind::Linear, 3.0, Some(2.0), 0.0);
        assert!((y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn predict_generic_sums_all_columns() {
        let coefs = [0.0, 2.0, 0.0, 1.0, 0.0];
        // 2k + k^2 + 5 at k = 3
        let y = predict_generic(&coefs, Some(5.0), 3.0);
        assert!((y - (6.0 + 9.0 + 5.0)).abs() < 1e-12);
    }
}
