//! Benchmark-log ingest and sanitization.
//!
//! This module turns a noisy benchmark log (interleaved stdout, truncated
//! lines, repeated headers, `-1` failure markers) into a clean set of
//! `MeasurementRecord`s that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for the header (clear errors + exit code 2)
//! - **Line-level filtering** that counts, never fails: a malformed body can
//!   at worst produce an empty dataset
//! - **Exact bookkeeping**: `accepted + rejected == data_lines` always
//! - **Separation of concerns**: no fitting logic here
//!
//! Lines are split on single commas with no quoting support. The producers
//! never quote fields, and a quoting-aware reader would reclassify exactly
//! the malformations this tool has to count.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

use serde::Serialize;

use crate::domain::{FitConfig, MeasurementRecord};
use crate::error::AppError;

/// Which header name supplied the problem size.
///
/// `K` is the stored-entry count directly. `N` is a matrix dimension; k is
/// derived as `round(N^2 * sparsity)`. `Ops` counts operations performed and
/// is used as k unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeColumn {
    K,
    N,
    Ops,
}

impl SizeColumn {
    pub fn label(self) -> &'static str {
        match self {
            SizeColumn::K => "k",
            SizeColumn::N => "N",
            SizeColumn::Ops => "Ops",
        }
    }
}

/// Resolved header schema for the run.
#[derive(Debug, Clone, Serialize)]
pub struct LogSchema {
    /// Header tokens, trimmed (BOM stripped from the first).
    pub columns: Vec<String>,
    pub width: usize,
    /// First header token; duplicated mid-file headers are recognized by it.
    pub header_token: String,
    pub size_column: SizeColumn,
    #[serde(skip)]
    cols: ColumnIndexes,
}

#[derive(Debug, Clone, Default)]
struct ColumnIndexes {
    operation: usize,
    structure: usize,
    size: usize,
    elapsed: usize,
    sparsity: Option<usize>,
    memory: Option<usize>,
}

/// Line/row bookkeeping.
///
/// Invariants: `accepted + rejected == data_lines`, and the record count is
/// `accepted - dropped` (`dropped` counts accepted lines removed by the
/// numeric post-pass).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SanitizeCounts {
    pub data_lines: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub dropped: usize,
}

/// Summary stats about the records actually kept.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub n_records: usize,
    pub k_min: u64,
    pub k_max: u64,
    pub elapsed_min_ns: f64,
    pub elapsed_max_ns: f64,
}

/// Sanitizer output: records + resolved schema + counters + stats.
///
/// `stats` is `None` when nothing survived; that is a legal output, not an
/// error (the caller still has counters to report).
#[derive(Debug, Clone)]
pub struct SanitizedLog {
    pub records: Vec<MeasurementRecord>,
    pub schema: LogSchema,
    pub counts: SanitizeCounts,
    pub stats: Option<DatasetStats>,
}

/// Load and sanitize a benchmark log.
///
/// Fatal only when the file cannot be opened or the header is absent, blank,
/// or structurally unusable. Every data-line problem is counted instead.
pub fn load_measurements(config: &FitConfig) -> Result<SanitizedLog, AppError> {
    let file = File::open(&config.log_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open log '{}': {e}", config.log_path.display()),
        )
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(Ok(line)) => line,
        Some(Err(e)) => return Err(AppError::new(2, format!("Failed to read header line: {e}"))),
        None => return Err(AppError::new(2, "Empty log: no header line.")),
    };
    let schema = resolve_schema(&header, config.expected_cols)?;

    let mut counts = SanitizeCounts::default();
    let mut records = Vec::new();

    for line in lines {
        let line =
            line.map_err(|e| AppError::new(2, format!("Failed to read log line: {e}")))?;
        counts.data_lines += 1;

        // Stage 1: line filter. Reject and move on; never error.
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != schema.width {
            counts.rejected += 1;
            continue;
        }
        if parts[0].trim() == schema.header_token {
            counts.rejected += 1;
            continue;
        }
        let Ok(size_raw) = parts[schema.cols.size].trim().parse::<i64>() else {
            counts.rejected += 1;
            continue;
        };
        let Ok(elapsed_ns) = parts[schema.cols.elapsed].trim().parse::<f64>() else {
            counts.rejected += 1;
            continue;
        };
        counts.accepted += 1;

        // Stage 2: numeric post-pass on the accepted line. Optional columns
        // coerce to None; mandatory-value violations drop the row.
        let sparsity = schema.cols.sparsity.and_then(|i| parse_opt_f64(parts[i]));
        let memory_bytes = schema.cols.memory.and_then(|i| parse_opt_f64(parts[i]));

        if !elapsed_ns.is_finite() || elapsed_ns < 0.0 {
            // The producers write Tempo_ns = -1 when a run failed.
            counts.dropped += 1;
            continue;
        }

        let size_k = match schema.size_column {
            SizeColumn::K | SizeColumn::Ops => {
                if size_raw < 0 {
                    counts.dropped += 1;
                    continue;
                }
                size_raw as u64
            }
            SizeColumn::N => {
                // k = round(N^2 * sparsity); underivable without sparsity.
                let Some(s) = sparsity else {
                    counts.dropped += 1;
                    continue;
                };
                if size_raw < 0 {
                    counts.dropped += 1;
                    continue;
                }
                let n = size_raw as f64;
                let k = (n * n * s).round();
                if !k.is_finite() {
                    counts.dropped += 1;
                    continue;
                }
                k as u64
            }
        };

        if let Some(max_k) = config.max_k {
            if size_k > max_k {
                counts.dropped += 1;
                continue;
            }
        }

        let operation = parts[schema.cols.operation].trim().to_string();
        let structure = canonical_structure(parts[schema.cols.structure].trim(), &config.aliases);

        records.push(MeasurementRecord {
            operation,
            structure,
            size_k,
            sparsity,
            elapsed_ns,
            memory_bytes,
        });
    }

    let stats = compute_stats(&records);
    Ok(SanitizedLog {
        records,
        schema,
        counts,
        stats,
    })
}

fn resolve_schema(header: &str, expected_cols: Option<usize>) -> Result<LogSchema, AppError> {
    if header.trim().is_empty() {
        return Err(AppError::new(2, "Empty log: blank header line."));
    }

    let columns: Vec<String> = header
        .split(',')
        .map(|name| name.trim().trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let width = columns.len();

    if let Some(expected) = expected_cols {
        if width != expected {
            return Err(AppError::new(
                2,
                format!("Header has {width} columns, expected {expected}."),
            ));
        }
    }

    let header_map: HashMap<String, usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let operation = require_column(&header_map, "operacao")?;
    let structure = require_column(&header_map, "estrutura")?;
    let elapsed = require_column(&header_map, "tempo_ns")?;
    let sparsity = header_map.get("esparsidade").copied();
    let memory = header_map.get("memoria_bytes").copied();

    let (size_column, size) = if let Some(&idx) = header_map.get("k") {
        (SizeColumn::K, idx)
    } else if let Some(&idx) = header_map.get("n") {
        if sparsity.is_none() {
            return Err(AppError::new(
                2,
                "Size column `N` requires an `Esparsidade` column to derive k.",
            ));
        }
        (SizeColumn::N, idx)
    } else if let Some(&idx) = header_map.get("ops") {
        (SizeColumn::Ops, idx)
    } else {
        return Err(AppError::new(
            2,
            "Missing size column: expected one of `k`, `N`, `Ops`.",
        ));
    };

    let header_token = columns[0].clone();

    Ok(LogSchema {
        columns,
        width,
        header_token,
        size_column,
        cols: ColumnIndexes {
            operation,
            structure,
            size,
            elapsed,
            sparsity,
            memory,
        },
    })
}

fn normalize_header_name(name: &str) -> String {
    // Some producers emit UTF-8 logs with a BOM prefix on the first header.
    // If we don't strip it, schema resolution incorrectly reports missing
    // columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
}

fn canonical_structure(token: &str, aliases: &[(String, String)]) -> String {
    for (from, to) in aliases {
        if token == from {
            return to.clone();
        }
    }
    token.to_string()
}

/// Optional-column coercion: unparsable, non-finite, or negative values all
/// become `None` (`-1` is the producers' missing-value marker here too).
fn parse_opt_f64(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 { Some(v) } else { None }
}

fn compute_stats(records: &[MeasurementRecord]) -> Option<DatasetStats> {
    if records.is_empty() {
        return None;
    }

    let mut k_min = u64::MAX;
    let mut k_max = 0u64;
    let mut elapsed_min = f64::INFINITY;
    let mut elapsed_max = f64::NEG_INFINITY;

    for r in records {
        k_min = k_min.min(r.size_k);
        k_max = k_max.max(r.size_k);
        elapsed_min = elapsed_min.min(r.elapsed_ns);
        elapsed_max = elapsed_max.max(r.elapsed_ns);
    }

    if !elapsed_min.is_finite() || !elapsed_max.is_finite() {
        return None;
    }

    Some(DatasetStats {
        n_records: records.len(),
        k_min,
        k_max,
        elapsed_min_ns: elapsed_min,
        elapsed_max_ns: elapsed_max,
    })
}
