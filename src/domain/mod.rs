//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`PipelineConfig`, `NoiseBound`, `ChartSpec`)
//! - the loaded table (`Dataset`, `Record`) and derived columns (`NamedSeries`)

pub mod dataset;
pub mod types;

pub use dataset::*;
pub use types::*;
