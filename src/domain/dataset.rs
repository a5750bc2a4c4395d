//! The in-memory table the pipeline works on.
//!
//! Original rows are kept as raw text so the augmented CSV reproduces every
//! input column; derived series are appended column-wise in attach order.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::AppError;

/// One validated input row.
#[derive(Debug, Clone)]
pub struct Record {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Raw field text for every header column, in header order.
    pub fields: Vec<String>,
}

impl Record {
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// A derived column: one value per record.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub date_index: usize,
    pub records: Vec<Record>,
    pub derived: Vec<NamedSeries>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.open).collect()
    }

    /// Earliest and latest date (rows need not be sorted).
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.date;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.date), hi.max(r.date))
        }))
    }

    fn header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header_index(name).is_some() || self.derived.iter().any(|s| s.name == name)
    }

    /// Numeric values of any column, original or derived.
    ///
    /// Original columns are parsed from their raw text; cells that are not
    /// numbers come back as `NaN` so the result stays aligned with the rows.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if let Some(series) = self.derived.iter().find(|s| s.name == name) {
            return Some(series.values.clone());
        }
        let idx = self.header_index(name)?;
        Some(
            self.records
                .iter()
                .map(|r| {
                    r.fields
                        .get(idx)
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        )
    }

    /// Append a derived column.
    pub fn attach(&mut self, series: NamedSeries) -> Result<(), AppError> {
        if series.values.len() != self.len() {
            return Err(AppError::LengthMismatch {
                name: series.name,
                expected: self.len(),
                actual: series.values.len(),
            });
        }
        if self.has_column(&series.name) {
            return Err(AppError::config(format!(
                "derived column '{}' collides with an existing column",
                series.name
            )));
        }
        self.derived.push(series);
        Ok(())
    }

    pub fn attach_all(&mut self, series: impl IntoIterator<Item = NamedSeries>) -> Result<(), AppError> {
        for s in series {
            self.attach(s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Small dataset with `Date,Open,High,Low,Close` columns.
    pub fn dataset(rows: &[(&str, f64, f64, f64)]) -> Dataset {
        let headers = ["Date", "Open", "High", "Low", "Close"]
            .map(String::from)
            .to_vec();
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, &(date, open, high, low))| Record {
                line: i + 2,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                open,
                high,
                low,
                fields: vec![
                    date.to_string(),
                    open.to_string(),
                    high.to_string(),
                    low.to_string(),
                    "n/a".to_string(),
                ],
            })
            .collect();
        Dataset {
            source: PathBuf::from("fixture.csv"),
            headers,
            date_index: 0,
            records,
            derived: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::dataset;
    use super::*;

    #[test]
    fn attach_rejects_wrong_length() {
        let mut ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0), ("2024-01-03", 9.5, 10.0, 9.0)]);
        let err = ds.attach(NamedSeries::new("P", vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            AppError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn attach_rejects_name_collision() {
        let mut ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0)]);
        assert!(ds.attach(NamedSeries::new("Open", vec![1.0])).is_err());
        ds.attach(NamedSeries::new("P", vec![1.0])).unwrap();
        assert!(ds.attach(NamedSeries::new("P", vec![2.0])).is_err());
    }

    #[test]
    fn column_reads_original_and_derived() {
        let mut ds = dataset(&[("2024-01-02", 9.0, 10.0, 8.0), ("2024-01-03", 9.5, 10.0, 9.0)]);
        ds.attach(NamedSeries::new("P", vec![1.0, 2.0])).unwrap();
        assert_eq!(ds.column("High").unwrap(), vec![10.0, 10.0]);
        assert_eq!(ds.column("P").unwrap(), vec![1.0, 2.0]);
        assert!(ds.column("Close").unwrap().iter().all(|v| v.is_nan()));
        assert!(ds.column("Volume").is_none());
    }

    #[test]
    fn date_range_ignores_row_order() {
        let ds = dataset(&[
            ("2024-03-01", 1.0, 1.0, 1.0),
            ("2024-01-01", 1.0, 1.0, 1.0),
            ("2024-02-01", 1.0, 1.0, 1.0),
        ]);
        let (lo, hi) = ds.date_range().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
