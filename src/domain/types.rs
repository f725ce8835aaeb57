//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Matrix operation measured by the benchmark harness.
///
/// Logs carry the harness' op codes (`SOMA`, `MULT`, ...). Parsing is
/// case-insensitive and returns `None` for labels the theory table does not
/// know; callers fall back to a linear model instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `SOMA`: element-wise sum over stored entries.
    ElementSum,
    /// `MULT`: sparse matrix multiplication.
    MatrixMul,
    /// `ESCALAR`: multiply every stored entry by a scalar.
    ScalarMul,
    /// `TRANS`: logical transpose.
    Transpose,
    /// `SET`: single point insert/update.
    PointSet,
    /// `GET`: single point lookup.
    PointGet,
}

impl Operation {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        for op in Self::ALL {
            if token.eq_ignore_ascii_case(op.log_token()) {
                return Some(op);
            }
        }
        None
    }

    /// The op code as it appears in benchmark logs.
    pub fn log_token(self) -> &'static str {
        match self {
            Operation::ElementSum => "SOMA",
            Operation::MatrixMul => "MULT",
            Operation::ScalarMul => "ESCALAR",
            Operation::Transpose => "TRANS",
            Operation::PointSet => "SET",
            Operation::PointGet => "GET",
        }
    }

    pub const ALL: [Operation; 6] = [
        Operation::ElementSum,
        Operation::MatrixMul,
        Operation::ScalarMul,
        Operation::Transpose,
        Operation::PointSet,
        Operation::PointGet,
    ];
}

/// Storage backend variant under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Hash,
    Tree,
}

impl Structure {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("hash") {
            Some(Structure::Hash)
        } else if token.eq_ignore_ascii_case("tree") {
            Some(Structure::Tree)
        } else {
            None
        }
    }

    pub fn log_token(self) -> &'static str {
        match self {
            Structure::Hash => "Hash",
            Structure::Tree => "Tree",
        }
    }
}

/// Structure labels folded into canonical names during sanitization unless the
/// caller supplies an alias table of its own.
pub const DEFAULT_ALIASES: [(&str, &str); 2] = [("Est1(Hash)", "Hash"), ("Est2(Tree)", "Tree")];

/// Owned copy of [`DEFAULT_ALIASES`].
pub fn default_aliases() -> Vec<(String, String)> {
    DEFAULT_ALIASES
        .iter()
        .map(|&(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Complexity shape used as a regression feature.
///
/// `Logarithmic` never appears in the theory table; it exists for the generic
/// polynomial basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Constant,
    Logarithmic,
    Linear,
    Linearithmic,
    Quadratic,
    QuadraticLog,
}

impl FeatureKind {
    /// Human-readable label for terminal output and exports.
    pub fn label(self) -> &'static str {
        match self {
            FeatureKind::Constant => "1",
            FeatureKind::Logarithmic => "log k",
            FeatureKind::Linear => "k",
            FeatureKind::Linearithmic => "k log k",
            FeatureKind::Quadratic => "k^2",
            FeatureKind::QuadraticLog => "k^2 log k",
        }
    }
}

/// One sanitized benchmark measurement.
///
/// `operation` and `structure` stay as canonicalized strings: unknown labels
/// must still flow through grouping and get the fallback model rather than
/// failing the batch.
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
    pub operation: String,
    pub structure: String,
    /// Stored-entry count (the problem size the models are expressed in).
    pub size_k: u64,
    pub sparsity: Option<f64>,
    pub elapsed_ns: f64,
    pub memory_bytes: Option<f64>,
}

impl MeasurementRecord {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ns / 1e6
    }

    pub fn memory_mb(&self) -> Option<f64> {
        self.memory_bytes.map(|b| b / 1e6)
    }
}

/// Partition key for per-series fitting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub operation: String,
    pub structure: String,
}

impl GroupKey {
    pub fn new(operation: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            structure: structure.into(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.operation, self.structure)
    }
}

/// What to report as R² when the observed values have (numerically) zero
/// variance. Both conventions exist in practice, so this is an explicit
/// setting rather than a silent constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZeroVariancePolicy {
    /// Report 1.0: a constant prediction reproduces a constant target exactly.
    Perfect,
    /// Report 0.0: there was no variance to explain.
    Zero,
}

impl ZeroVariancePolicy {
    pub fn conventional_value(self) -> f64 {
        match self {
            ZeroVariancePolicy::Perfect => 1.0,
            ZeroVariancePolicy::Zero => 0.0,
        }
    }
}

/// Fit quality. `zero_variance` marks `r_squared` as the configured convention
/// rather than a measured ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Goodness {
    pub r_squared: f64,
    pub zero_variance: bool,
}

/// Output of a linear least-squares fit.
///
/// `coefficients` holds one entry per design column (never empty);
/// single-feature fits have exactly one. `predictions` is aligned with the
/// rows the fit was computed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearFit {
    pub coefficients: Vec<f64>,
    pub intercept: Option<f64>,
    pub goodness: Goodness,
    pub predictions: Vec<f64>,
}

/// Output of a log-log power-law fit: `time ≈ amplitude · k^exponent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLawFit {
    pub amplitude: f64,
    pub exponent: f64,
    pub goodness: Goodness,
    /// Rows that survived the positivity mask.
    pub n_used: usize,
}

/// A smooth prediction curve over a group's observed size range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    pub k: Vec<f64>,
    pub predicted: Vec<f64>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub log_path: PathBuf,

    /// When set, the header must have exactly this many columns.
    pub expected_cols: Option<usize>,
    /// Structure aliases folded to canonical names during sanitization.
    pub aliases: Vec<(String, String)>,
    /// Rows with k above this bound are dropped in the post-pass.
    pub max_k: Option<u64>,

    /// Minimum rows a group needs before it is fitted.
    pub min_group_points: usize,
    /// Fit the theory feature with a free intercept instead of through the origin.
    pub with_intercept: bool,
    /// Also fit the alternate-intercept, generic-polynomial, and power-law models.
    pub compare: bool,
    pub zero_variance: ZeroVariancePolicy,
    /// Points on each projected curve.
    pub curve_points: usize,
    /// Sort groups by key instead of first-encounter order.
    pub sort_groups: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_predictions: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
}

impl FitConfig {
    /// Baseline configuration for a log path; the CLI layers flags on top.
    pub fn for_log(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            expected_cols: None,
            aliases: default_aliases(),
            max_k: None,
            min_group_points: 3,
            with_intercept: false,
            compare: false,
            zero_variance: ZeroVariancePolicy::Perfect,
            curve_points: 300,
            sort_groups: false,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_predictions: None,
            export_report: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_parse_is_case_insensitive() {
        assert_eq!(Operation::parse("soma"), Some(Operation::ElementSum));
        assert_eq!(Operation::parse(" MULT "), Some(Operation::MatrixMul));
        assert_eq!(Operation::parse("escalar"), Some(Operation::ScalarMul));
        assert_eq!(Operation::parse("TRANS"), Some(Operation::Transpose));
        assert_eq!(Operation::parse("set"), Some(Operation::PointSet));
        assert_eq!(Operation::parse("Get"), Some(Operation::PointGet));
        assert_eq!(Operation::parse("JOIN"), None);
    }

    #[test]
    fn structure_parse_is_case_insensitive() {
        assert_eq!(Structure::parse("Hash"), Some(Structure::Hash));
        assert_eq!(Structure::parse("TREE"), Some(Structure::Tree));
        assert_eq!(Structure::parse("Est1(Hash)"), None);
    }

    #[test]
    fn derived_units_scale_from_base_columns() {
        let rec = MeasurementRecord {
            operation: "SOMA".to_string(),
            structure: "Hash".to_string(),
            size_k: 100,
            sparsity: Some(0.01),
            elapsed_ns: 2_500_000.0,
            memory_bytes: Some(3_000_000.0),
        };
        assert!((rec.elapsed_ms() - 2.5).abs() < 1e-12);
        assert!((rec.memory_mb().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn group_key_display_joins_tokens() {
        let key = GroupKey::new("SOMA", "Hash");
        assert_eq!(key.to_string(), "SOMA/Hash");
    }
}
