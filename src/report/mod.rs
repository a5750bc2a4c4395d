//! Reporting: confirmation lines and run summaries.

pub mod format;

pub use format::*;
