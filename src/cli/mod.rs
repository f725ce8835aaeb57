//! Command-line parsing for the benchmark complexity fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the sanitizing/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ZeroVariancePolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "bigo",
    version,
    about = "Benchmark-log sanitizer and complexity-model fitter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sanitize a benchmark log, fit per-group complexity models, print a report.
    Fit(FitArgs),
    /// Sanitize a benchmark log and report schema/counts without fitting.
    Check(CheckArgs),
    /// Generate a synthetic benchmark log.
    Synth(SynthArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Benchmark log (CSV) to fit.
    pub log: PathBuf,

    /// Require the header to have exactly this many columns.
    #[arg(long, value_name = "N")]
    pub expected_cols: Option<usize>,

    /// Extra structure alias, FROM=TO (repeatable, applied before the defaults).
    #[arg(long = "alias", value_parser = parse_alias, value_name = "FROM=TO")]
    pub aliases: Vec<(String, String)>,

    /// Drop records with k above this bound.
    #[arg(long)]
    pub max_k: Option<u64>,

    /// Minimum records a group needs before it is fitted.
    #[arg(long, default_value_t = 3)]
    pub min_group_points: usize,

    /// Fit theory models with a free intercept instead of through the origin.
    #[arg(long)]
    pub with_intercept: bool,

    /// Also fit alternate-intercept, generic-polynomial and power-law models.
    #[arg(long)]
    pub compare: bool,

    /// R2 convention when the measured times have zero variance.
    #[arg(long, value_enum, default_value_t = ZeroVariancePolicy::Perfect)]
    pub zero_variance: ZeroVariancePolicy,

    /// Points on each projected curve.
    #[arg(long, default_value_t = 300)]
    pub curve_points: usize,

    /// Sort groups by name instead of first-encounter order.
    #[arg(long)]
    pub sort_groups: bool,

    /// Render an ASCII plot per fitted group.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-measurement predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full run report to JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

/// Options for checking a log without fitting.
#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    /// Benchmark log (CSV) to check.
    pub log: PathBuf,

    /// Require the header to have exactly this many columns.
    #[arg(long, value_name = "N")]
    pub expected_cols: Option<usize>,

    /// Extra structure alias, FROM=TO (repeatable, applied before the defaults).
    #[arg(long = "alias", value_parser = parse_alias, value_name = "FROM=TO")]
    pub aliases: Vec<(String, String)>,

    /// Drop records with k above this bound.
    #[arg(long)]
    pub max_k: Option<u64>,
}

/// Options for synthetic log generation.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output path for the generated log.
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Sizes (stored-entry counts) to measure at.
    #[arg(long, value_delimiter = ',', default_values_t = [100u64, 500, 1000, 5000, 10000, 50000])]
    pub sizes: Vec<u64>,

    /// Log-space noise sigma applied to each timing.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Insert one corrupt line after every N clean lines.
    #[arg(long, value_name = "N")]
    pub corrupt_every: Option<usize>,
}

/// Parse a `FROM=TO` alias pair.
fn parse_alias(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => Err(format!("expected FROM=TO, got '{s}'")),
    }
}
