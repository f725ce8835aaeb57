//! Export fitted results to CSV and JSON.
//!
//! The CSV holds one row per measurement with measured and predicted times,
//! easy to consume in spreadsheets or downstream scripts. The JSON report is
//! the full machine-readable output: schema, counts, per-group fits and
//! skipped groups.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{FitConfig, GroupKey, ZeroVariancePolicy};
use crate::error::AppError;
use crate::fit::{GroupFit, GroupedReport, SkipReason};
use crate::io::ingest::{DatasetStats, LogSchema, SanitizeCounts, SanitizedLog};

/// Write per-measurement predictions to a CSV file.
///
/// The power-law column is left blank for groups without a power-law fit and
/// for rows whose k cannot be evaluated in log space.
pub fn write_predictions_csv(path: &Path, report: &GroupedReport) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create predictions CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(
        file,
        "Operacao,Estrutura,k,Tempo_medido_ns,Tempo_predito_ns,Tempo_predito_potencia_ns"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write predictions CSV header: {e}")))?;

    for group in &report.groups {
        for i in 0..group.k.len() {
            let k = group.k[i];
            let power = match &group.power_law {
                Some(p) if k > 0.0 => format!("{:.4}", p.amplitude * k.powf(p.exponent)),
                _ => String::new(),
            };
            writeln!(
                file,
                "{},{},{},{:.4},{:.4},{}",
                group.key.operation,
                group.key.structure,
                k,
                group.measured_ns[i],
                group.theory.predictions[i],
                power,
            )
            .map_err(|e| AppError::new(2, format!("Failed to write predictions CSV row: {e}")))?;
        }
    }

    Ok(())
}

/// Schema of the JSON report file.
#[derive(Debug, Serialize)]
pub struct ReportFile<'a> {
    pub tool: &'a str,
    pub generated: DateTime<Local>,
    pub source: String,
    pub schema: &'a LogSchema,
    pub counts: SanitizeCounts,
    pub stats: Option<&'a DatasetStats>,
    pub with_intercept: bool,
    pub zero_variance: ZeroVariancePolicy,
    pub min_group_points: usize,
    pub curve_points: usize,
    pub groups: &'a [GroupFit],
    pub skipped: &'a [(GroupKey, SkipReason)],
}

/// Write the full run report as pretty-printed JSON.
pub fn write_report_json(
    path: &Path,
    log: &SanitizedLog,
    report: &GroupedReport,
    config: &FitConfig,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create report JSON '{}': {e}", path.display()),
        )
    })?;

    let doc = ReportFile {
        tool: "bigo",
        generated: Local::now(),
        source: config.log_path.display().to_string(),
        schema: &log.schema,
        counts: log.counts,
        stats: log.stats.as_ref(),
        with_intercept: config.with_intercept,
        zero_variance: config.zero_variance,
        min_group_points: config.min_group_points,
        curve_points: config.curve_points,
        groups: &report.groups,
        skipped: &report.skipped,
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}
