//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - benchmark vocabulary (`Operation`, `Structure`, `FeatureKind`)
//! - sanitized measurement rows (`MeasurementRecord`) and group keys
//! - fit outputs (`LinearFit`, `PowerLawFit`, `Curve`, `Goodness`)
//! - run configuration (`FitConfig`, `ZeroVariancePolicy`)

pub mod types;

pub use types::*;
