//! `yield-sim` library crate.
//!
//! The binary (`yieldsim`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the noise source can be swapped for a deterministic one in tests
//! - each stage (ingest, synth, metrics, export, plot) stays separately usable

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod synth;
