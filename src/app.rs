//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - resolves the run configuration
//! - runs the pipeline and prints confirmations + summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, Cli, Command, ProfilesArgs, RunArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `yieldsim` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Check(args) => handle_check(args),
        Command::Profiles(args) => handle_profiles(args),
    }
}

fn init_tracing() {
    // stdout carries confirmations and summaries; diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yield_sim=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = crate::config::resolve(args.profile, args.config.as_deref(), args.overrides())?;
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format_confirmations(&run));
    println!();
    println!("{}", crate::report::format_run_summary(&run, &config));
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let dataset = crate::io::ingest::load_dataset(&args.input, &args.date_column)?;
    println!("{}", crate::report::format_check_summary(&dataset));
    Ok(())
}

fn handle_profiles(args: ProfilesArgs) -> Result<(), AppError> {
    match args.show {
        Some(profile) => print!("{}", crate::config::to_toml(&profile.config())?),
        None => println!("{}", crate::report::format_profiles()),
    }
    Ok(())
}
