//! Per-group orchestration of the fitting pipeline.
//!
//! Responsibilities:
//! - partition sanitized records into (operation, structure) groups
//! - enforce the minimum-points guardrail
//! - fit each remaining group and project its display curve
//! - record skipped groups with a reason instead of failing the run
//!
//! Groups are independent, so they are fitted in parallel; the output keeps
//! the report order (first encounter in the log, or lexicographic when
//! sorting is requested).

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{
    Curve, FeatureKind, FitConfig, GroupKey, LinearFit, MeasurementRecord, PowerLawFit,
};
use crate::fit::engine::{fit_feature, fit_generic, fit_power_law};
use crate::fit::projection::project_curve;
use crate::models::{GENERIC_FEATURES, theoretical_feature};

/// One group's measurements, sorted by ascending k.
#[derive(Debug, Clone)]
pub struct GroupSeries {
    pub key: GroupKey,
    pub k: Vec<f64>,
    pub elapsed_ns: Vec<f64>,
}

/// Why a group produced no fit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TooFewPoints { n: usize, min: usize },
    Degenerate(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooFewPoints { n, min } => {
                write!(f, "too few points ({n} < {min})")
            }
            SkipReason::Degenerate(msg) => write!(f, "degenerate fit: {msg}"),
        }
    }
}

/// A fully fitted group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFit {
    pub key: GroupKey,
    /// Feature assigned by the theory table.
    pub feature: FeatureKind,
    pub n_points: usize,
    /// Sizes and measured times, k-ascending, one entry per record.
    pub k: Vec<f64>,
    pub measured_ns: Vec<f64>,
    /// Primary fit against the theory feature.
    pub theory: LinearFit,
    /// Dense theory curve spanning the observed size range.
    pub curve: Curve,
    /// Theory fit with the opposite intercept setting (compare mode only).
    pub theory_alt: Option<LinearFit>,
    /// Free-form polynomial fit (compare mode, needs enough rows).
    pub generic: Option<LinearFit>,
    /// Power-law fit (compare mode; absent when too few positive rows).
    pub power_law: Option<PowerLawFit>,
    /// Non-fatal diagnostics about comparison fits that could not run.
    pub notes: Vec<String>,
}

/// Everything a fitting run produced, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedReport {
    pub groups: Vec<GroupFit>,
    pub skipped: Vec<(GroupKey, SkipReason)>,
}

/// Split records into per-group series, keeping first-encounter order
/// unless lexicographic sorting is requested.
pub fn partition_groups(records: &[MeasurementRecord], sort_groups: bool) -> Vec<GroupSeries> {
    let mut map: IndexMap<GroupKey, Vec<(u64, f64)>> = IndexMap::new();
    for record in records {
        map.entry(GroupKey::new(&record.operation, &record.structure))
            .or_default()
            .push((record.size_k, record.elapsed_ns));
    }

    let mut series: Vec<GroupSeries> = map
        .into_iter()
        .map(|(key, mut rows)| {
            // Stable sort: repeated sizes keep their log order.
            rows.sort_by_key(|&(k, _)| k);
            GroupSeries {
                key,
                k: rows.iter().map(|&(k, _)| k as f64).collect(),
                elapsed_ns: rows.iter().map(|&(_, t)| t).collect(),
            }
        })
        .collect();

    if sort_groups {
        series.sort_by(|a, b| {
            (a.key.operation.as_str(), a.key.structure.as_str())
                .cmp(&(b.key.operation.as_str(), b.key.structure.as_str()))
        });
    }

    series
}

enum GroupOutcome {
    Fitted(Box<GroupFit>),
    Skipped(GroupKey, SkipReason),
}

/// Fit every group in `records` according to `config`.
///
/// Per-group problems (too few points, numerically degenerate data) land in
/// `skipped`; they never abort the other groups.
pub fn fit_groups(records: &[MeasurementRecord], config: &FitConfig) -> GroupedReport {
    let series = partition_groups(records, config.sort_groups);

    let outcomes: Vec<GroupOutcome> = series
        .into_par_iter()
        .map(|s| fit_one_group(s, config))
        .collect();

    let mut groups = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            GroupOutcome::Fitted(group) => groups.push(*group),
            GroupOutcome::Skipped(key, reason) => skipped.push((key, reason)),
        }
    }

    GroupedReport { groups, skipped }
}

fn fit_one_group(series: GroupSeries, config: &FitConfig) -> GroupOutcome {
    let n = series.k.len();
    if n < config.min_group_points {
        return GroupOutcome::Skipped(
            series.key,
            SkipReason::TooFewPoints {
                n,
                min: config.min_group_points,
            },
        );
    }

    let feature = theoretical_feature(&series.key.operation, &series.key.structure);

    let theory = match fit_feature(
        feature,
        &series.k,
        &series.elapsed_ns,
        config.with_intercept,
        config.zero_variance,
    ) {
        Ok(fit) => fit,
        Err(e) => {
            return GroupOutcome::Skipped(series.key, SkipReason::Degenerate(e.to_string()));
        }
    };

    let curve = project_curve(
        feature,
        theory.coefficients[0],
        theory.intercept,
        series.k[0],
        series.k[n - 1],
        config.curve_points,
    );

    let mut theory_alt = None;
    let mut generic = None;
    let mut power_law = None;
    let mut notes = Vec::new();

    if config.compare {
        match fit_feature(
            feature,
            &series.k,
            &series.elapsed_ns,
            !config.with_intercept,
            config.zero_variance,
        ) {
            Ok(fit) => theory_alt = Some(fit),
            Err(e) => notes.push(format!("alternate-intercept fit unavailable: {e}")),
        }

        // One row per basis column plus the intercept.
        let generic_unknowns = GENERIC_FEATURES.len() + 1;
        if n >= generic_unknowns {
            match fit_generic(&series.k, &series.elapsed_ns, true, config.zero_variance) {
                Ok(fit) => generic = Some(fit),
                Err(e) => notes.push(format!("generic fit unavailable: {e}")),
            }
        } else {
            notes.push(format!(
                "generic fit needs {generic_unknowns} points, group has {n}"
            ));
        }

        match fit_power_law(&series.k, &series.elapsed_ns, config.zero_variance) {
            Ok(fit) => power_law = fit,
            Err(e) => notes.push(format!("power-law fit unavailable: {e}")),
        }
    }

    GroupOutcome::Fitted(Box::new(GroupFit {
        key: series.key,
        feature,
        n_points: n,
        k: series.k,
        measured_ns: series.elapsed_ns,
        theory,
        curve,
        theory_alt,
        generic,
        power_law,
        notes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(operation: &str, structure: &str, k: u64, ns: f64) -> MeasurementRecord {
        MeasurementRecord {
            operation: operation.to_string(),
            structure: structure.to_string(),
            size_k: k,
            sparsity: Some(0.01),
            elapsed_ns: ns,
            memory_bytes: None,
        }
    }

    fn config() -> FitConfig {
        FitConfig::for_log("unused.csv")
    }

    #[test]
    fn groups_keep_first_encounter_order() {
        let records = vec![
            record("SOMA", "Hash", 10, 100.0),
            record("MULT", "Tree", 10, 100.0),
            record("SOMA", "Hash", 100, 1000.0),
            record("SOMA", "Tree", 10, 100.0),
            record("MULT", "Tree", 100, 1000.0),
        ];

        let series = partition_groups(&records, false);
        let keys: Vec<String> = series.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["SOMA/Hash", "MULT/Tree", "SOMA/Tree"]);
    }

    #[test]
    fn sorted_mode_orders_groups_lexicographically() {
        let records = vec![
            record("SOMA", "Tree", 10, 100.0),
            record("MULT", "Hash", 10, 100.0),
            record("SOMA", "Hash", 10, 100.0),
        ];

        let series = partition_groups(&records, true);
        let keys: Vec<String> = series.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["MULT/Hash", "SOMA/Hash", "SOMA/Tree"]);
    }

    #[test]
    fn rows_within_a_group_are_k_sorted() {
        let records = vec![
            record("GET", "Hash", 1000, 3.0),
            record("GET", "Hash", 10, 1.0),
            record("GET", "Hash", 100, 2.0),
        ];

        let series = partition_groups(&records, false);
        assert_eq!(series[0].k, vec![10.0, 100.0, 1000.0]);
        assert_eq!(series[0].elapsed_ns, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn undersized_groups_are_skipped_with_reason() {
        let records = vec![
            record("SOMA", "Hash", 10, 100.0),
            record("SOMA", "Hash", 100, 1000.0),
        ];

        let report = fit_groups(&records, &config());
        assert!(report.groups.is_empty());
        assert_eq!(report.skipped.len(), 1);
        match &report.skipped[0].1 {
            SkipReason::TooFewPoints { n, min } => {
                assert_eq!(*n, 2);
                assert_eq!(*min, 3);
            }
            other => panic!("unexpected skip reason: {other}"),
        }
    }

    #[test]
    fn linear_group_fits_with_expected_slope_and_curve_span() {
        let records = vec![
            record("SOMA", "Hash", 10, 100.0),
            record("SOMA", "Hash", 100, 1000.0),
            record("SOMA", "Hash", 1000, 10000.0),
        ];

        let report = fit_groups(&records, &config());
        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];

        assert_eq!(group.feature, FeatureKind::Linear);
        assert!((group.theory.coefficients[0] - 10.0).abs() < 1e-6);
        assert!((group.theory.goodness.r_squared - 1.0).abs() < 1e-9);

        assert_eq!(group.curve.k.len(), config().curve_points);
        assert_eq!(group.curve.k[0], 10.0);
        assert_eq!(*group.curve.k.last().unwrap(), 1000.0);
    }

    #[test]
    fn compare_mode_adds_alternate_and_power_law_fits() {
        let mut cfg = config();
        cfg.compare = true;

        let records: Vec<MeasurementRecord> = (1..=4)
            .map(|i| record("SOMA", "Hash", i * 10, (i * 10) as f64 * 7.0))
            .collect();

        let report = fit_groups(&records, &cfg);
        let group = &report.groups[0];

        assert!(group.theory_alt.is_some());
        assert!(group.power_law.is_some());
        // Four rows cannot support the six-unknown polynomial.
        assert!(group.generic.is_none());
        assert!(group.notes.iter().any(|n| n.contains("generic fit needs")));

        let power = group.power_law.as_ref().unwrap();
        assert!((power.exponent - 1.0).abs() < 1e-6);
        assert!((power.amplitude - 7.0).abs() < 1e-6);
    }

    #[test]
    fn compare_mode_fits_generic_with_enough_rows() {
        let mut cfg = config();
        cfg.compare = true;

        let records: Vec<MeasurementRecord> = (1..=8)
            .map(|i| record("MULT", "Hash", i * 10, ((i * 10) * (i * 10)) as f64 * 2.0))
            .collect();

        let report = fit_groups(&records, &cfg);
        let group = &report.groups[0];
        let generic = group.generic.as_ref().unwrap();
        assert_eq!(generic.coefficients.len(), GENERIC_FEATURES.len());
        assert!(generic.goodness.r_squared > 0.999);
    }

    #[test]
    fn non_finite_measurements_mark_the_group_degenerate() {
        let records = vec![
            record("SOMA", "Hash", 10, f64::NAN),
            record("SOMA", "Hash", 100, 1000.0),
            record("SOMA", "Hash", 1000, 10000.0),
        ];

        let report = fit_groups(&records, &config());
        assert!(report.groups.is_empty());
        assert!(matches!(report.skipped[0].1, SkipReason::Degenerate(_)));
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let report = fit_groups(&[], &config());
        assert!(report.groups.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn unknown_pairs_fall_back_to_linear() {
        let records = vec![
            record("FOO", "Hash", 10, 100.0),
            record("FOO", "Hash", 100, 1000.0),
            record("FOO", "Hash", 1000, 10000.0),
        ];

        let report = fit_groups(&records, &config());
        assert_eq!(report.groups[0].feature, FeatureKind::Linear);
    }
}
