//! Time-series PNG charts rendered with Plotters.
//!
//! Chart data is resolved from the dataset up front (`resolve_chart`) so a
//! chart that names an unknown column fails before anything is written.
//! Rendering itself is purely presentational.

use std::fs::create_dir_all;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::debug;

use crate::domain::{ChartSpec, Dataset, Marker};
use crate::error::AppError;

/// Output image size in pixels.
pub const CHART_SIZE: (u32, u32) = (1200, 600);

const MARKER_SIZE: i32 = 3;

/// One resolved line: values aligned with the dataset rows.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub legend: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
    pub marker: Marker,
}

/// Look up every series a chart names.
pub fn resolve_chart(dataset: &Dataset, spec: &ChartSpec) -> Result<Vec<PlotSeries>, AppError> {
    spec.series
        .iter()
        .enumerate()
        .map(|(idx, series)| {
            let values = dataset.column(&series.column).ok_or_else(|| {
                AppError::config(format!(
                    "chart '{}' references unknown column '{}'",
                    spec.title, series.column
                ))
            })?;
            Ok(PlotSeries {
                legend: series.legend.clone(),
                values,
                color: series.color_or_default(idx).rgb(),
                marker: series.marker,
            })
        })
        .collect()
}

/// Render `series` against `dates` and write a PNG to `path`.
///
/// The parent directory is created if it does not exist.
pub fn render_chart(path: &Path, dates: &[NaiveDate], series: &[PlotSeries], spec: &ChartSpec) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    let (x0, x1) = date_bounds(dates).ok_or_else(|| AppError::Render {
        path: path.to_path_buf(),
        message: "no dates to plot".to_string(),
    })?;
    let (y0, y1) = value_bounds(series.iter().map(|s| s.values.as_slice()));

    draw(path, dates, series, spec, (x0, x1), (y0, y1)).map_err(|e| AppError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(path = %path.display(), lines = series.len(), "chart rendered");
    Ok(())
}

fn draw(
    path: &Path,
    dates: &[NaiveDate],
    series: &[PlotSeries],
    spec: &ChartSpec,
    (x0, x1): (NaiveDate, NaiveDate),
    (y0, y1): (f64, f64),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), ("sans-serif", 22))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(72)
        .build_cartesian_2d(RangedDate::from(x0..x1), y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(10)
        .y_labels(8)
        .x_label_formatter(&|d: &NaiveDate| d.format("%b %Y").to_string())
        .light_line_style(&RGBColor(235, 235, 235))
        .draw()?;

    for s in series {
        let color = s.color;
        let points: Vec<(NaiveDate, f64)> = dates
            .iter()
            .copied()
            .zip(s.values.iter().copied())
            .filter(|(_, v)| v.is_finite())
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(s.legend.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        let fill = color.filled();
        match s.marker {
            Marker::Circle => {
                chart.draw_series(points.iter().map(|&p| Circle::new(p, MARKER_SIZE, fill)))?;
            }
            Marker::Cross => {
                chart.draw_series(points.iter().map(|&p| Cross::new(p, MARKER_SIZE, color.stroke_width(2))))?;
            }
            Marker::Triangle => {
                chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, MARKER_SIZE + 1, fill)))?;
            }
            Marker::Square => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new([(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)], fill)
                }))?;
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Earliest and latest date, widened by a day when they coincide.
pub fn date_bounds(dates: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    let lo = dates.iter().min().copied()?;
    let hi = dates.iter().max().copied()?;
    if lo == hi {
        return Some((lo - Duration::days(1), hi + Duration::days(1)));
    }
    Some((lo, hi))
}

/// Y range over all finite values with 5% headroom on each side.
///
/// Falls back to `[0, 1]` when nothing is finite, and pads a flat series so the
/// range is never empty.
pub fn value_bounds<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> (f64, f64) {
    let (lo, hi) = series
        .into_iter()
        .flat_map(|values| values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }

    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(0.5)
    };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::fixtures::dataset;
    use crate::domain::{NamedSeries, SeriesColor, SeriesRef};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn spec(series: Vec<SeriesRef>) -> ChartSpec {
        ChartSpec {
            title: "Actual Open Yield vs Predicted Open Yield".to_string(),
            name: "Actual vs Predicted Yield".to_string(),
            file_name: "chart.png".to_string(),
            x_label: "Date".to_string(),
            y_label: "Yield".to_string(),
            series,
        }
    }

    #[test]
    fn date_bounds_widen_single_day() {
        let (lo, hi) = date_bounds(&[d("2024-05-10")]).unwrap();
        assert_eq!(lo, d("2024-05-09"));
        assert_eq!(hi, d("2024-05-11"));
        assert!(date_bounds(&[]).is_none());
        let (lo, hi) = date_bounds(&[d("2024-03-01"), d("2023-01-01"), d("2024-01-01")]).unwrap();
        assert_eq!((lo, hi), (d("2023-01-01"), d("2024-03-01")));
    }

    #[test]
    fn value_bounds_skip_non_finite_and_pad() {
        let a = [1.0, f64::INFINITY, 3.0];
        let b = [f64::NAN, 2.0];
        let (lo, hi) = value_bounds([&a[..], &b[..]]);
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);

        let flat = [4.0, 4.0];
        let (lo, hi) = value_bounds([&flat[..]]);
        assert!(lo < 4.0 && hi > 4.0);

        let nothing = [f64::NAN];
        assert_eq!(value_bounds([&nothing[..]]), (0.0, 1.0));
    }

    #[test]
    fn resolve_uses_palette_and_explicit_styles() {
        let mut ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0)]);
        ds.attach(NamedSeries::new("MSE", vec![0.04])).unwrap();
        let chart = spec(vec![
            SeriesRef::new("Open", "Actual Open Yield"),
            SeriesRef::new("MSE", "Mean Square Error (MSE)").styled(SeriesColor::Red, Marker::Square),
        ]);
        let resolved = resolve_chart(&ds, &chart).unwrap();
        assert_eq!(resolved[0].color, SeriesColor::Blue.rgb());
        assert_eq!(resolved[0].values, vec![9.0]);
        assert_eq!(resolved[1].color, SeriesColor::Red.rgb());
        assert_eq!(resolved[1].marker, Marker::Square);
    }

    #[test]
    fn resolve_unknown_column_is_config_error() {
        let ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0)]);
        let chart = spec(vec![SeriesRef::new("Predicted Yield", "Predicted")]);
        let err = resolve_chart(&ds, &chart).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("'Predicted Yield'")));
    }

    #[test]
    fn renders_png_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("chart.png");

        let mut ds = dataset(&[
            ("2024-01-02", 4.10, 4.20, 4.00),
            ("2024-02-01", 4.00, 4.15, 3.90),
            ("2024-03-01", 0.00, 0.10, -0.10),
        ]);
        ds.attach(NamedSeries::new("MAPE", vec![2.0, 1.5, f64::INFINITY])).unwrap();
        let chart = spec(vec![
            SeriesRef::new("Open", "Actual Open Yield"),
            SeriesRef::new("MAPE", "MAPE").styled(SeriesColor::Purple, Marker::Triangle),
            SeriesRef::new("High", "High").styled(SeriesColor::Green, Marker::Cross),
            SeriesRef::new("Low", "Low").styled(SeriesColor::Black, Marker::Square),
        ]);
        let series = resolve_chart(&ds, &chart).unwrap();

        render_chart(&path, &ds.dates(), &series, &chart).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
