//! Formatted terminal output.
//!
//! Kept in one place so the pipeline code stays free of presentation details.

use std::fmt::Write as _;

use crate::app::pipeline::RunOutput;
use crate::config::Profile;
use crate::domain::{Dataset, PipelineConfig};

/// One confirmation line per artifact, in the order they were written.
pub fn format_confirmations(run: &RunOutput) -> String {
    run.artifacts
        .iter()
        .map(|a| a.confirmation())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dataset shape plus the dataset-level aggregates of the per-record metrics.
pub fn format_run_summary(run: &RunOutput, config: &PipelineConfig) -> String {
    let mut out = String::new();
    let s = &run.summary;

    out.push_str("=== yieldsim run summary ===\n");
    out.push_str(&format_dataset_line(&run.dataset));

    out.push_str("Predicted series:\n");
    for bound in &config.noise_bounds {
        let _ = writeln!(out, "  {:<32} noise [{:+.2}, {:+.2}]", bound.label, bound.low, bound.high);
    }

    let _ = writeln!(out, "Errors vs `{}` over {} rows:", config.metric_source, s.n);
    let _ = writeln!(out, "  MSE   {:.6}", s.mse);
    let _ = writeln!(out, "  RMSE  {:.6}", s.rmse);
    let _ = writeln!(out, "  MAE   {:.6}", s.mae);
    if s.mape_excluded > 0 {
        let _ = writeln!(out, "  MAPE  {:.4}%  ({} non-finite rows excluded)", s.mape, s.mape_excluded);
    } else {
        let _ = writeln!(out, "  MAPE  {:.4}%", s.mape);
    }

    match config.seed {
        Some(seed) => {
            let _ = write!(out, "Seed: {seed}");
        }
        None => out.push_str("Seed: none (fresh noise each run)"),
    }

    out
}

/// Output of `yieldsim check`.
pub fn format_check_summary(dataset: &Dataset) -> String {
    let mut out = String::new();
    out.push_str(&format_dataset_line(dataset));
    let _ = write!(out, "Columns: {}", dataset.headers.join(", "));
    out
}

fn format_dataset_line(dataset: &Dataset) -> String {
    let mut out = format!(
        "Input: {} | rows={}\n",
        dataset.source.display(),
        dataset.len(),
    );
    if let Some((lo, hi)) = dataset.date_range() {
        let _ = writeln!(out, "Dates: {lo} .. {hi}");
    }
    out
}

/// Output of `yieldsim profiles`.
pub fn format_profiles() -> String {
    let mut out = String::from("Built-in profiles:\n");
    for profile in Profile::ALL {
        let config = profile.config();
        let _ = writeln!(
            out,
            "  {:<8} {} ({} series, {} charts)",
            profile.name(),
            profile.description(),
            config.noise_bounds.len(),
            config.chart_specs.len(),
        );
    }
    out.push_str("Use `yieldsim profiles --show <name>` to print one as TOML.");
    out
}
