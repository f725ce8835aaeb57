//! Shared "fit pipeline" logic behind the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! sanitize -> group -> fit -> project
//!
//! The CLI can then focus on presentation (printing and exports).

use crate::domain::FitConfig;
use crate::error::AppError;
use crate::fit::{GroupedReport, fit_groups};
use crate::io::ingest::{SanitizedLog, load_measurements};

/// All computed outputs of a single `bigo fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub log: SanitizedLog,
    pub report: GroupedReport,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let log = load_measurements(config)?;
    let report = fit_groups(&log.records, config);
    Ok(RunOutput { log, report })
}

/// Reject configurations the pipeline cannot honor before touching the log.
pub fn validate_config(config: &FitConfig) -> Result<(), AppError> {
    if config.min_group_points < 1 {
        return Err(AppError::new(2, "Minimum group points must be >= 1."));
    }
    if config.curve_points < 2 {
        return Err(AppError::new(2, "Curve points must be >= 2."));
    }
    Ok(())
}
