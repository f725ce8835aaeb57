//! Input/output helpers.
//!
//! - benchmark log ingest + sanitization (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
