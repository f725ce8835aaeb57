//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - solve single-feature, polynomial-basis and power-law least squares
//! - partition records into (operation, structure) groups and fit each
//! - project fitted models onto dense display curves

pub mod engine;
pub mod grouped;
pub mod projection;

pub use engine::*;
pub use grouped::*;
pub use projection::*;
