//! Terminal reporting for fit and check runs.

pub mod format;

pub use format::*;
