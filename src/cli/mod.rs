//! Command-line parsing for the synthetic yield pipeline.
//!
//! Argument parsing and dispatch live here and in `app`; the pipeline itself
//! only ever sees a resolved `PipelineConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Overrides, Profile};
use crate::domain::ApePolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "yieldsim",
    version,
    about = "Synthetic predicted-yield generator with per-day error metrics and charts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load prices, synthesize predicted yields, compute metrics, write CSV and charts.
    Run(RunArgs),
    /// Load and validate an input file without writing anything.
    Check(CheckArgs),
    /// List the built-in profiles, or print one as TOML.
    Profiles(ProfilesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Built-in configuration to start from.
    #[arg(short, long, value_enum, default_value_t = Profile::Single)]
    pub profile: Profile,

    /// TOML file with a full pipeline configuration (replaces the profile).
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Input CSV with Date, Open, High and Low columns.
    #[arg(short, long, env = "YIELDSIM_INPUT")]
    pub input: Option<PathBuf>,

    /// Where to write the augmented CSV (overwritten if present).
    #[arg(long, env = "YIELDSIM_OUTPUT_CSV")]
    pub output_csv: Option<PathBuf>,

    /// Directory for chart images (created if missing).
    #[arg(long, env = "YIELDSIM_PLOT_DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Name of the date column.
    #[arg(long)]
    pub date_column: Option<String>,

    /// Seed the noise generator for a reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// How to handle a zero actual value in the percentage error.
    #[arg(long, value_enum)]
    pub ape_policy: Option<ApePolicy>,

    /// Skip chart rendering.
    #[arg(long)]
    pub no_plots: bool,
}

impl RunArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            input_path: self.input.clone(),
            output_csv_path: self.output_csv.clone(),
            output_plot_dir: self.plot_dir.clone(),
            date_column: self.date_column.clone(),
            seed: self.seed,
            ape_policy: self.ape_policy,
            no_plots: self.no_plots,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    /// Input CSV to validate.
    #[arg(short, long, env = "YIELDSIM_INPUT", default_value = crate::config::DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Name of the date column.
    #[arg(long, default_value = "Date")]
    pub date_column: String,
}

#[derive(Debug, Args, Clone)]
pub struct ProfilesArgs {
    /// Print this profile as a TOML config file.
    #[arg(long, value_enum)]
    pub show: Option<Profile>,
}
