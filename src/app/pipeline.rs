//! The end-to-end run: load -> synthesize -> metrics -> persist -> plot.
//!
//! Everything that can fail on bad input (schema, numeric domain, unknown chart
//! columns) is checked before the first output file is touched.

use std::path::PathBuf;

use tracing::info;

use crate::domain::{Dataset, PipelineConfig};
use crate::error::AppError;
use crate::io::export::write_augmented_csv;
use crate::io::ingest::load_dataset;
use crate::metrics::{MetricSummary, compute_metrics};
use crate::plot::{render_chart, resolve_chart};
use crate::synth::{NoiseSource, UniformNoise, synthesize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    Table,
    Chart { name: String },
}

/// A file produced by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    /// The line printed for this artifact once it is on disk.
    pub fn confirmation(&self) -> String {
        match &self.kind {
            ArtifactKind::Table => {
                format!("Predicted yield and metrics saved to {}", self.path.display())
            }
            ArtifactKind::Chart { name } => format!("{name} plot saved to {}", self.path.display()),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub summary: MetricSummary,
    pub artifacts: Vec<Artifact>,
}

/// Run with noise drawn from `config.seed` (fresh entropy when unset).
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let mut noise = UniformNoise::from_seed_option(config.seed);
    run_pipeline_with_noise(config, &mut noise)
}

/// Run with an explicit noise source.
pub fn run_pipeline_with_noise<N: NoiseSource + ?Sized>(
    config: &PipelineConfig,
    noise: &mut N,
) -> Result<RunOutput, AppError> {
    config.validate()?;

    // 1) Load + validate the input table.
    let mut dataset = load_dataset(&config.input_path, &config.date_column)?;
    info!(path = %config.input_path.display(), rows = dataset.len(), "loaded input");

    // 2) Predicted series.
    let predicted = synthesize(&dataset, &config.noise_bounds, noise)?;
    dataset.attach_all(predicted)?;

    // 3) Per-record metrics against the configured predicted series.
    let source = dataset.column(&config.metric_source).ok_or_else(|| {
        AppError::config(format!("metric source '{}' was not synthesized", config.metric_source))
    })?;
    let metrics = compute_metrics(&dataset.opens(), &source, config.ape_policy)?;
    let summary = MetricSummary::from_metrics(&metrics);
    dataset.attach_all(metrics.into_series())?;
    info!(source = %config.metric_source, mse = summary.mse, mae = summary.mae, "metrics computed");

    // 4) Resolve chart data up front so a bad chart spec fails before any write.
    let charts = config
        .chart_specs
        .iter()
        .map(|spec| resolve_chart(&dataset, spec).map(|series| (spec, series)))
        .collect::<Result<Vec<_>, AppError>>()?;

    // 5) Persist.
    let mut artifacts = Vec::with_capacity(charts.len() + 1);
    write_augmented_csv(&config.output_csv_path, &dataset)?;
    info!(path = %config.output_csv_path.display(), "wrote augmented csv");
    artifacts.push(Artifact {
        kind: ArtifactKind::Table,
        path: config.output_csv_path.clone(),
    });

    if config.render_plots {
        let dates = dataset.dates();
        for (spec, series) in &charts {
            let path = config.chart_path(spec);
            render_chart(&path, &dates, series, spec)?;
            info!(path = %path.display(), chart = %spec.name, "wrote chart");
            artifacts.push(Artifact {
                kind: ArtifactKind::Chart {
                    name: spec.name.clone(),
                },
                path,
            });
        }
    }

    Ok(RunOutput {
        dataset,
        summary,
        artifacts,
    })
}
