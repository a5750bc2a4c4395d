//! Shared configuration and chart types.
//!
//! These are serde-friendly so a whole run can be described in a TOML file and
//! so the built-in profiles can be printed back out as a starting point.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::ValueEnum;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Name of the column every metric is measured against.
pub const ACTUAL_COLUMN: &str = "Open";

/// A named uniform noise interval used to synthesize one predicted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseBound {
    pub label: String,
    pub low: f64,
    pub high: f64,
}

impl NoiseBound {
    /// Symmetric bound `[-half_width, +half_width]`.
    pub fn symmetric(label: impl Into<String>, half_width: f64) -> Self {
        Self {
            label: label.into(),
            low: -half_width,
            high: half_width,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.label.trim().is_empty() {
            return Err(AppError::config("noise bound label must not be empty"));
        }
        if !(self.low.is_finite() && self.high.is_finite()) {
            return Err(AppError::config(format!(
                "noise bound '{}' must be finite (got {}..{})",
                self.label, self.low, self.high
            )));
        }
        if self.low > self.high {
            return Err(AppError::config(format!(
                "noise bound '{}' has low {} > high {}",
                self.label, self.low, self.high
            )));
        }
        // Uniform sampling scales by the span, which must stay well inside f64 range.
        if !(self.high - self.low).is_finite() || self.high - self.low > f64::MAX / 2.0 {
            return Err(AppError::config(format!(
                "noise bound '{}' is too wide ({}..{})",
                self.label, self.low, self.high
            )));
        }
        Ok(())
    }
}

/// What to do when the actual value is zero and APE has no finite value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApePolicy {
    /// Keep the non-finite value (`inf`, or `NaN` for `0 / 0`).
    #[default]
    Propagate,
    /// Fail the run with a numeric domain error naming the row.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Orange,
    Green,
    Red,
    Purple,
    Brown,
    Black,
}

impl SeriesColor {
    /// Palette used when a series does not pick its own colour.
    pub const PALETTE: [SeriesColor; 6] = [
        SeriesColor::Blue,
        SeriesColor::Orange,
        SeriesColor::Green,
        SeriesColor::Red,
        SeriesColor::Purple,
        SeriesColor::Brown,
    ];

    pub fn rgb(self) -> RGBColor {
        match self {
            SeriesColor::Blue => RGBColor(31, 119, 180),
            SeriesColor::Orange => RGBColor(255, 127, 14),
            SeriesColor::Green => RGBColor(44, 160, 44),
            SeriesColor::Red => RGBColor(214, 39, 40),
            SeriesColor::Purple => RGBColor(148, 103, 189),
            SeriesColor::Brown => RGBColor(140, 86, 75),
            SeriesColor::Black => RGBColor(0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Circle,
    Cross,
    Triangle,
    Square,
}

/// One line on a chart: which column to draw and how to label it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRef {
    /// Column name in the augmented dataset (original or derived).
    pub column: String,
    /// Legend text.
    pub legend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SeriesColor>,
    #[serde(default)]
    pub marker: Marker,
}

impl SeriesRef {
    pub fn new(column: impl Into<String>, legend: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            legend: legend.into(),
            color: None,
            marker: Marker::Circle,
        }
    }

    pub fn styled(mut self, color: SeriesColor, marker: Marker) -> Self {
        self.color = Some(color);
        self.marker = marker;
        self
    }

    /// Resolved colour: explicit, or the palette entry for this line's index.
    pub fn color_or_default(&self, index: usize) -> SeriesColor {
        self.color
            .unwrap_or(SeriesColor::PALETTE[index % SeriesColor::PALETTE.len()])
    }
}

/// A time-series chart written to `<output_plot_dir>/<file_name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// Short name used in the confirmation line ("MSE plot saved to ...").
    pub name: String,
    pub file_name: String,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<SeriesRef>,
}

fn default_x_label() -> String {
    "Date".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_render_plots() -> bool {
    true
}

/// Everything one pipeline run needs.
///
/// Built from a profile, optionally replaced by a TOML file, then patched by
/// CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    pub output_csv_path: PathBuf,
    pub output_plot_dir: PathBuf,
    /// Label of the predicted series the error metrics compare against.
    pub metric_source: String,
    #[serde(default)]
    pub ape_policy: ApePolicy,
    /// Fixed RNG seed. `None` draws fresh noise on every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_render_plots")]
    pub render_plots: bool,
    // Table-valued fields stay last: TOML keys must precede tables.
    pub noise_bounds: Vec<NoiseBound>,
    #[serde(default)]
    pub chart_specs: Vec<ChartSpec>,
}

impl PipelineConfig {
    /// Checks that only need the config itself (no input file).
    pub fn validate(&self) -> Result<(), AppError> {
        if self.date_column.trim().is_empty() {
            return Err(AppError::config("date column name must not be empty"));
        }
        if self.noise_bounds.is_empty() {
            return Err(AppError::config("at least one noise bound is required"));
        }

        let mut labels = HashSet::new();
        for bound in &self.noise_bounds {
            bound.validate()?;
            if !labels.insert(bound.label.as_str()) {
                return Err(AppError::config(format!(
                    "duplicate noise bound label '{}'",
                    bound.label
                )));
            }
        }

        if !labels.contains(self.metric_source.as_str()) {
            return Err(AppError::config(format!(
                "metric source '{}' is not one of the noise bound labels",
                self.metric_source
            )));
        }

        let mut files = HashSet::new();
        for chart in &self.chart_specs {
            if chart.file_name.trim().is_empty() {
                return Err(AppError::config(format!(
                    "chart '{}' has an empty file name",
                    chart.title
                )));
            }
            if chart.series.is_empty() {
                return Err(AppError::config(format!(
                    "chart '{}' has no series",
                    chart.title
                )));
            }
            if !files.insert(chart.file_name.as_str()) {
                return Err(AppError::config(format!(
                    "two charts write to the same file '{}'",
                    chart.file_name
                )));
            }
        }

        Ok(())
    }

    pub fn chart_path(&self, chart: &ChartSpec) -> PathBuf {
        self.output_plot_dir.join(&chart.file_name)
    }
}
