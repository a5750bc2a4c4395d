//! CSV ingest and validation.
//!
//! Turns a daily price export into a `Dataset`:
//! - **Strict schema** for the date, `High`, `Low` and `Open` columns
//! - **Row-level validation**: the first unreadable row fails the load, naming its line
//! - every other column is carried through untouched

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::debug;

use crate::domain::{Dataset, Record};
use crate::error::AppError;

const PRICE_COLUMNS: [&str; 3] = ["High", "Low", "Open"];

/// Load `path` and validate the required columns.
pub fn load_dataset(path: &Path, date_column: &str) -> Result<Dataset, AppError> {
    if !path.is_file() {
        return Err(AppError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let columns = {
        let header_map: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        Columns {
            date: require_column(&header_map, path, date_column)?,
            high: require_column(&header_map, path, PRICE_COLUMNS[0])?,
            low: require_column(&header_map, path, PRICE_COLUMNS[1])?,
            open: require_column(&header_map, path, PRICE_COLUMNS[2])?,
            width: headers.len(),
        }
    };

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header occupies line 1.
        let line = idx + 2;
        let record = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &columns, date_column, line))
            .map_err(|message| AppError::Row {
                path: path.to_path_buf(),
                line,
                message,
            })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(AppError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), rows = records.len(), "dataset loaded");

    Ok(Dataset {
        source: path.to_path_buf(),
        headers,
        date_index: columns.date,
        records,
        derived: Vec::new(),
    })
}

struct Columns {
    date: usize,
    high: usize,
    low: usize,
    open: usize,
    width: usize,
}

fn require_column(header_map: &HashMap<&str, usize>, path: &Path, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::Schema {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn csv_error(path: &Path, err: csv::Error) -> AppError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => AppError::io(path, source),
        other => AppError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{other:?}")),
        ),
    }
}

fn parse_row(record: &StringRecord, columns: &Columns, date_column: &str, line: usize) -> Result<Record, String> {
    let date = parse_date(get_required(record, columns.date, date_column)?)?;
    let high = parse_price(get_required(record, columns.high, "High")?, "High")?;
    let low = parse_price(get_required(record, columns.low, "Low")?, "Low")?;
    let open = parse_price(get_required(record, columns.open, "Open")?, "Open")?;

    // Short rows are padded so every record has one field per header.
    let fields = (0..columns.width)
        .map(|i| record.get(i).unwrap_or_default().to_string())
        .collect();

    Ok(Record {
        line,
        date,
        open,
        high,
        low,
        fields,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_price(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{s}'.")),
    }
}

/// Parse a calendar date in one of the formats price exports commonly use.
///
/// Slash-separated dates are read month-first (`MM/DD/YYYY`).
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const DATE_FMTS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, MM/DD/YYYY, YYYY/MM/DD, Mon DD, YYYY, DD-MM-YYYY."
    ))
}
