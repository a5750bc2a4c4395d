//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - augmented CSV export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
