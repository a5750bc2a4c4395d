//! Write the augmented dataset back out as CSV.
//!
//! Original columns come first (dates normalised to ISO), then every derived
//! column in the order it was attached.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::Dataset;
use crate::error::AppError;

/// Write `dataset` to `path`, replacing any existing file.
///
/// Rows go to a sibling temp file first; only a fully written file is
/// renamed over `path`.
pub fn write_augmented_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    if let Err(err) = write_rows(&tmp, dataset) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::io(path, e)
    })?;

    debug!(
        path = %path.display(),
        rows = dataset.len(),
        derived = dataset.derived.len(),
        "augmented csv written"
    );
    Ok(())
}

fn write_rows(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;

    let header = dataset
        .headers
        .iter()
        .map(String::as_str)
        .chain(dataset.derived.iter().map(|s| s.name.as_str()));
    writer.write_record(header).map_err(|e| csv_error(path, e))?;

    for (row, record) in dataset.records.iter().enumerate() {
        let mut out: Vec<String> = Vec::with_capacity(record.fields.len() + dataset.derived.len());
        for (idx, field) in record.fields.iter().enumerate() {
            if idx == dataset.date_index {
                out.push(record.date.format("%Y-%m-%d").to_string());
            } else {
                out.push(field.clone());
            }
        }
        out.extend(dataset.derived.iter().map(|s| s.values[row].to_string()));
        writer.write_record(&out).map_err(|e| csv_error(path, e))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn csv_error(path: &Path, err: csv::Error) -> AppError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => AppError::io(path, source),
        other => AppError::io(path, std::io::Error::other(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NamedSeries;
    use crate::domain::dataset::fixtures::dataset;
    use crate::io::ingest::load_dataset;

    #[test]
    fn round_trip_keeps_rows_and_derived_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("result.csv");

        let mut ds = dataset(&[
            ("2024-01-02", 9.0, 10.0, 8.0),
            ("2024-01-03", 4.0, 4.5, 3.9),
            ("2024-01-04", 0.0, 0.1, -0.1),
        ]);
        ds.attach(NamedSeries::new("Predicted Yield", vec![9.2, 4.213_456_789_012_3, 0.05]))
            .unwrap();
        ds.attach(NamedSeries::new("MAPE", vec![2.222_222_222_222_2, 5.3, f64::INFINITY]))
            .unwrap();

        write_augmented_csv(&path, &ds).unwrap();
        let back = load_dataset(&path, "Date").unwrap();

        assert_eq!(back.len(), ds.len());
        assert_eq!(
            back.headers,
            vec!["Date", "Open", "High", "Low", "Close", "Predicted Yield", "MAPE"]
        );
        let predicted = back.column("Predicted Yield").unwrap();
        for (a, b) in predicted.iter().zip(&ds.derived[0].values) {
            assert!((a - b).abs() < 1e-12);
        }
        let mape = back.column("MAPE").unwrap();
        assert!((mape[0] - 2.222_222_222_222_2).abs() < 1e-12);
        assert!(mape[2].is_infinite());
        assert_eq!(back.records[1].fields[4], "n/a");
    }

    #[test]
    fn overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        fs::write(&path, "stale contents that are much longer than the new file\n".repeat(50)).unwrap();

        let ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0)]);
        write_augmented_csv(&path, &ds).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Date,Open,High,Low,Close\n2024-01-02,9,10,8,n/a"));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn unwritable_target_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file sits where the parent directory should be created.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0)]);
        let err = write_augmented_csv(&blocker.join("result.csv"), &ds).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
        assert_eq!(err.exit_code(), 5);
    }
}
