//! Formatted terminal output for fit and check runs.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::FitConfig;
use crate::fit::{GroupFit, GroupedReport, partition_groups};
use crate::io::ingest::{SanitizeCounts, SanitizedLog};

/// Format the full run summary: sanitizer counts, dataset range and one
/// block per fitted group.
pub fn format_run_summary(
    log: &SanitizedLog,
    report: &GroupedReport,
    config: &FitConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== bigo - Benchmark Complexity Fit ===\n");
    out.push_str(&format!("Log: {}\n", config.log_path.display()));
    out.push_str(&format!(
        "Schema: {} columns | size column: {}\n",
        log.schema.width,
        log.schema.size_column.label()
    ));
    out.push_str(&format_counts_line(&log.counts, log.records.len()));
    if let Some(stats) = &log.stats {
        out.push_str(&format!(
            "Range: k=[{}, {}] | t=[{:.1}, {:.1}]ns\n",
            stats.k_min, stats.k_max, stats.elapsed_min_ns, stats.elapsed_max_ns
        ));
    }

    if config.with_intercept {
        out.push_str("\nFits (a*f(k) + b):\n");
    } else {
        out.push_str("\nFits (a*f(k)):\n");
    }
    for group in &report.groups {
        out.push_str(&format_group_block(group));
    }
    for (key, reason) in &report.skipped {
        out.push_str(&format!("  (skipped {key}) {reason}\n"));
    }

    if report
        .groups
        .iter()
        .any(|g| g.theory.goodness.zero_variance)
    {
        out.push_str("\n(*) R2 set by the zero-variance convention\n");
    }
    out.push('\n');

    out
}

/// Format the check summary: schema, counts and per-group record tallies,
/// with no fitting involved.
pub fn format_check_summary(log: &SanitizedLog, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== bigo - Log Check ===\n");
    out.push_str(&format!("Log: {}\n", config.log_path.display()));
    out.push_str(&format!("Columns: {}\n", log.schema.columns.join(", ")));
    out.push_str(&format!(
        "Size column: {}\n",
        log.schema.size_column.label()
    ));
    out.push_str(&format_counts_line(&log.counts, log.records.len()));
    match &log.stats {
        Some(stats) => out.push_str(&format!(
            "Range: k=[{}, {}] | t=[{:.1}, {:.1}]ns\n",
            stats.k_min, stats.k_max, stats.elapsed_min_ns, stats.elapsed_max_ns
        )),
        None => out.push_str("Range: no usable records\n"),
    }

    let series = partition_groups(&log.records, true);
    if !series.is_empty() {
        out.push_str("\nGroups:\n");
        for s in &series {
            out.push_str(&format!("  {:<16} n={}\n", s.key.to_string(), s.k.len()));
        }
    }

    out
}

fn format_counts_line(counts: &SanitizeCounts, n_records: usize) -> String {
    format!(
        "Lines: data={} accepted={} rejected={} dropped={} records={}\n",
        counts.data_lines, counts.accepted, counts.rejected, counts.dropped, n_records
    )
}

fn format_group_block(group: &GroupFit) -> String {
    let mut out = String::new();

    let marker = if group.theory.goodness.zero_variance {
        "*"
    } else {
        " "
    };
    out.push_str(&format!(
        "  {:<16} {:<10} a={:<14} b={:<14} R2={:>8.4}{marker} n={}\n",
        group.key.to_string(),
        group.feature.label(),
        fmt_num(group.theory.coefficients[0]),
        group
            .theory
            .intercept
            .map(fmt_num)
            .unwrap_or_else(|| "-".to_string()),
        group.theory.goodness.r_squared,
        group.n_points,
    ));

    if let Some(alt) = &group.theory_alt {
        out.push_str(&format!(
            "      alt intercept: a={} b={} R2={:.4}\n",
            fmt_num(alt.coefficients[0]),
            alt.intercept
                .map(fmt_num)
                .unwrap_or_else(|| "-".to_string()),
            alt.goodness.r_squared,
        ));
    }
    if let Some(generic) = &group.generic {
        out.push_str(&format!(
            "      generic basis: R2={:.4}\n",
            generic.goodness.r_squared
        ));
    }
    if let Some(power) = &group.power_law {
        out.push_str(&format!(
            "      power law: T(k) ~ {} * k^{:.4}  R2={:.4} (n={})\n",
            fmt_num(power.amplitude),
            power.exponent,
            power.goodness.r_squared,
            power.n_used,
        ));
    }
    for note in &group.notes {
        out.push_str(&format!("      note: {note}\n"));
    }

    out
}

fn fmt_num(v: f64) -> String {
    format!("{v:.4}")
}
