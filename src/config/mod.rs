//! Run configuration: built-in profiles and TOML config files.
//!
//! Two profiles ship with the binary:
//!
//! - `single`: four predicted series, metrics against `Predicted Yield`, one
//!   actual-vs-predicted chart plus one chart per metric
//! - `multi`: three predicted series keyed by input window, metrics against
//!   `Predicted Yield (input=250)`, one actual-vs-predicted chart per window
//!
//! A TOML file replaces the profile wholesale; CLI flags patch whatever was
//! loaded.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ACTUAL_COLUMN, ApePolicy, ChartSpec, Marker, NoiseBound, PipelineConfig, SeriesColor, SeriesRef,
};
use crate::error::AppError;

pub const DEFAULT_INPUT: &str = "data/5year.csv";
pub const DEFAULT_OUTPUT_CSV: &str = "data/5year_result_rnn.csv";
pub const DEFAULT_PLOT_DIR: &str = "data";

const ACTUAL_LEGEND: &str = "Actual Open Yield";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Single,
    Multi,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Single, Profile::Multi];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Single => "single",
            Profile::Multi => "multi",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Profile::Single => "four predicted series, metrics vs `Predicted Yield`",
            Profile::Multi => "three input windows, metrics vs `Predicted Yield (input=250)`",
        }
    }

    pub fn config(self) -> PipelineConfig {
        match self {
            Profile::Single => single_profile(),
            Profile::Multi => multi_profile(),
        }
    }
}

fn base(noise_bounds: Vec<NoiseBound>, metric_source: &str, chart_specs: Vec<ChartSpec>) -> PipelineConfig {
    PipelineConfig {
        input_path: PathBuf::from(DEFAULT_INPUT),
        date_column: "Date".to_string(),
        output_csv_path: PathBuf::from(DEFAULT_OUTPUT_CSV),
        output_plot_dir: PathBuf::from(DEFAULT_PLOT_DIR),
        noise_bounds,
        metric_source: metric_source.to_string(),
        chart_specs,
        ape_policy: ApePolicy::Propagate,
        seed: None,
        render_plots: true,
    }
}

fn chart(name: &str, title: String, file_name: &str, y_label: &str, series: Vec<SeriesRef>) -> ChartSpec {
    ChartSpec {
        title,
        name: name.to_string(),
        file_name: file_name.to_string(),
        x_label: "Date".to_string(),
        y_label: y_label.to_string(),
        series,
    }
}

/// Metric charts shared by both profiles; `suffix` is appended to titles.
fn metric_charts(suffix: &str, styled: bool) -> Vec<ChartSpec> {
    let metrics = [
        ("MSE", "Mean Square Error (MSE)", "Error Value", SeriesColor::Red, Marker::Circle),
        ("MAE", "Mean Absolute Error (MAE)", "Error Value", SeriesColor::Blue, Marker::Cross),
        ("RMSE", "Root Mean Square Error (RMSE)", "Error Value", SeriesColor::Green, Marker::Triangle),
        (
            "MAPE",
            "Mean Absolute Percentage Error (MAPE)",
            "Error Value (%)",
            SeriesColor::Purple,
            Marker::Square,
        ),
    ];

    metrics
        .into_iter()
        .map(|(column, legend, y_label, color, marker)| {
            let mut series = SeriesRef::new(column, legend);
            if styled {
                series = series.styled(color, marker);
            }
            chart(
                column,
                format!("Daily {column} between Actual Open Yield and Predicted Open Yield{suffix}"),
                &format!("{column}_rnn.png"),
                y_label,
                vec![series],
            )
        })
        .collect()
}

fn single_profile() -> PipelineConfig {
    let bounds = vec![
        NoiseBound::symmetric("Predicted Yield", 0.4),
        NoiseBound::symmetric("Predicted Yield (input=250)", 0.3),
        NoiseBound::symmetric("Predicted Yield (input=30)", 0.5),
        NoiseBound::symmetric("Predicted Yield (input=60)", 0.4),
    ];

    let mut charts = vec![chart(
        "Actual vs Predicted Yield",
        "Actual Open Yield vs Predicted Open Yield".to_string(),
        "different_rnn.png",
        "Yield",
        vec![
            SeriesRef::new(ACTUAL_COLUMN, ACTUAL_LEGEND).styled(SeriesColor::Blue, Marker::Circle),
            SeriesRef::new("Predicted Yield", "Predicted Open Yield").styled(SeriesColor::Orange, Marker::Cross),
        ],
    )];
    charts.extend(metric_charts("", true));

    base(bounds, "Predicted Yield", charts)
}

fn multi_profile() -> PipelineConfig {
    let windows = [30, 60, 250];
    let bounds = vec![
        NoiseBound::symmetric("Predicted Yield (input=250)", 0.4),
        NoiseBound::symmetric("Predicted Yield (input=30)", 0.6),
        NoiseBound::symmetric("Predicted Yield (input=60)", 0.5),
    ];

    let mut charts: Vec<ChartSpec> = windows
        .iter()
        .map(|window| {
            let label = format!("Predicted Yield (input={window})");
            chart(
                &format!("Actual vs Predicted Yields (input={window})"),
                format!("Actual Open Yield vs Predicted Yields (input={window})"),
                &format!("actual_vs_predicted_open_yield_input{window}.png"),
                "Yield",
                vec![
                    SeriesRef::new(ACTUAL_COLUMN, ACTUAL_LEGEND),
                    SeriesRef::new(label.clone(), label),
                ],
            )
        })
        .collect();
    charts.extend(metric_charts(" (input=250)", false));

    base(bounds, "Predicted Yield (input=250)", charts)
}

/// Read a full `PipelineConfig` from a TOML file.
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, AppError> {
    if !path.is_file() {
        return Err(AppError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    parse_config(&text).map_err(|e| AppError::config(format!("{}: {e}", path.display())))
}

pub fn parse_config(text: &str) -> Result<PipelineConfig, toml::de::Error> {
    toml::from_str(text)
}

pub fn to_toml(config: &PipelineConfig) -> Result<String, AppError> {
    toml::to_string_pretty(config).map_err(|e| AppError::config(format!("cannot serialise config: {e}")))
}

/// CLI-level overrides applied on top of a profile or config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_path: Option<PathBuf>,
    pub output_csv_path: Option<PathBuf>,
    pub output_plot_dir: Option<PathBuf>,
    pub date_column: Option<String>,
    pub seed: Option<u64>,
    pub ape_policy: Option<ApePolicy>,
    pub no_plots: bool,
}

impl Overrides {
    pub fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(p) = self.input_path {
            config.input_path = p;
        }
        if let Some(p) = self.output_csv_path {
            config.output_csv_path = p;
        }
        if let Some(p) = self.output_plot_dir {
            config.output_plot_dir = p;
        }
        if let Some(c) = self.date_column {
            config.date_column = c;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(policy) = self.ape_policy {
            config.ape_policy = policy;
        }
        if self.no_plots {
            config.render_plots = false;
        }
        config
    }
}

/// Resolve the effective configuration: file (if any) or profile, then overrides.
pub fn resolve(profile: Profile, config_file: Option<&Path>, overrides: Overrides) -> Result<PipelineConfig, AppError> {
    let loaded = match config_file {
        Some(path) => load_config_file(path)?,
        None => profile.config(),
    };
    let config = overrides.apply(loaded);
    config.validate()?;
    Ok(config)
}
