use std::fs;
use std::path::Path;

use yield_sim::app::pipeline::{ArtifactKind, run_pipeline};
use yield_sim::config::{Overrides, Profile, resolve};
use yield_sim::domain::PipelineConfig;
use yield_sim::error::AppError;
use yield_sim::io::ingest::load_dataset;
use yield_sim::metrics::METRIC_COLUMNS;

const PRICES: &str = "\
Date,Price,Open,High,Low,Change %
01/31/2024,3.911,3.930,3.960,3.880,-0.50%
02/01/2024,3.865,3.905,3.925,3.840,-1.18%
02/02/2024,4.083,3.870,4.110,3.860,5.64%
03/01/2024,4.153,4.250,4.260,4.140,-2.40%
04/01/2024,4.335,4.210,4.350,4.200,3.10%
05/01/2024,4.510,4.620,4.650,4.480,-1.50%
06/03/2024,4.408,4.480,4.495,4.390,-2.20%
";

fn config_for(dir: &Path, profile: Profile, seed: Option<u64>, plots: bool) -> PipelineConfig {
    let input = dir.join("5year.csv");
    fs::write(&input, PRICES).unwrap();
    let overrides = Overrides {
        input_path: Some(input),
        output_csv_path: Some(dir.join("out").join("5year_result_rnn.csv")),
        output_plot_dir: Some(dir.join("plots")),
        seed,
        no_plots: !plots,
        ..Overrides::default()
    };
    resolve(profile, None, overrides).unwrap()
}

#[test]
fn multi_profile_writes_csv_and_every_chart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), Profile::Multi, Some(2024), true);

    let run = run_pipeline(&config).unwrap();

    let tables = run
        .artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Table)
        .count();
    assert_eq!(tables, 1);
    assert_eq!(run.artifacts.len(), 1 + config.chart_specs.len());
    for chart in &config.chart_specs {
        let path = config.output_plot_dir.join(&chart.file_name);
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']), "{}", path.display());
    }

    let back = load_dataset(&config.output_csv_path, "Date").unwrap();
    assert_eq!(back.len(), 7);
    assert_eq!(back.headers[..6], ["Date", "Price", "Open", "High", "Low", "Change %"]);
    assert_eq!(back.records[0].fields[0], "2024-01-31");
    assert_eq!(back.records[0].fields[5], "-0.50%");

    for bound in &config.noise_bounds {
        let written = back.column(&bound.label).unwrap();
        let computed = run.dataset.column(&bound.label).unwrap();
        assert_eq!(written.len(), back.len());
        for ((w, c), rec) in written.iter().zip(&computed).zip(&back.records) {
            assert!((w - c).abs() < 1e-12);
            let u = w - rec.midpoint();
            assert!(u >= bound.low - 1e-9 && u <= bound.high + 1e-9);
        }
    }

    let predicted = back.column(&config.metric_source).unwrap();
    let mse = back.column("MSE").unwrap();
    let rmse = back.column("RMSE").unwrap();
    let mae = back.column("MAE").unwrap();
    let mape = back.column("MAPE").unwrap();
    for (i, rec) in back.records.iter().enumerate() {
        let ae = (rec.open - predicted[i]).abs();
        assert!((mae[i] - ae).abs() < 1e-12);
        assert!((mse[i] - ae * ae).abs() < 1e-12);
        assert!((rmse[i] - mae[i]).abs() < 1e-12);
        assert!((mape[i] - ae / rec.open * 100.0).abs() < 1e-9);
    }
}

#[test]
fn same_seed_reproduces_the_csv() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let config_a = config_for(a.path(), Profile::Single, Some(7), false);
    let config_b = config_for(b.path(), Profile::Single, Some(7), false);

    run_pipeline(&config_a).unwrap();
    run_pipeline(&config_b).unwrap();

    assert_eq!(
        fs::read_to_string(&config_a.output_csv_path).unwrap(),
        fs::read_to_string(&config_b.output_csv_path).unwrap()
    );
}

#[test]
fn unseeded_runs_draw_fresh_noise() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), Profile::Single, None, false);

    let first = run_pipeline(&config).unwrap();
    let second = run_pipeline(&config).unwrap();

    assert_ne!(
        first.dataset.column("Predicted Yield").unwrap(),
        second.dataset.column("Predicted Yield").unwrap()
    );
}

#[test]
fn metric_columns_follow_predicted_columns() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), Profile::Single, Some(1), false);
    run_pipeline(&config).unwrap();

    let back = load_dataset(&config.output_csv_path, "Date").unwrap();
    let derived: Vec<&str> = back.headers[6..].iter().map(String::as_str).collect();
    let mut expected: Vec<&str> = config.noise_bounds.iter().map(|b| b.label.as_str()).collect();
    expected.extend(METRIC_COLUMNS);
    assert_eq!(derived, expected);
}

#[test]
fn missing_input_fails_without_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path(), Profile::Single, None, true);
    config.input_path = dir.path().join("missing.csv");

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, AppError::FileNotFound { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!config.output_csv_path.exists());
    assert!(!config.output_plot_dir.exists());
}

#[test]
fn missing_column_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path(), Profile::Single, None, false);
    let input = dir.path().join("no_low.csv");
    fs::write(&input, "Date,Open,High\n2024-01-02,4.0,4.1\n").unwrap();
    config.input_path = input;

    match run_pipeline(&config) {
        Err(AppError::Schema { column, .. }) => assert_eq!(column, "Low"),
        other => panic!("expected schema error, got {other:?}"),
    }
}
