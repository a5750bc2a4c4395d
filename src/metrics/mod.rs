//! Per-record error metrics between actual and predicted values.
//!
//! The columns carry the conventional aggregate names (`MSE`, `RMSE`, `MAE`,
//! `MAPE`) but hold one value per record:
//!
//! - `MSE`  = `(A - P)^2`
//! - `RMSE` = `sqrt((A - P)^2)`, i.e. `|A - P|`
//! - `MAE`  = `|A - P|`
//! - `MAPE` = `|A - P| / A * 100`
//!
//! The real dataset-level aggregates are available from [`MetricSummary`].

use tracing::debug;

use crate::domain::{ApePolicy, NamedSeries};
use crate::error::AppError;

/// Column names of the metric series, in the order they are appended.
pub const METRIC_COLUMNS: [&str; 4] = ["MSE", "RMSE", "MAE", "MAPE"];

/// Four aligned per-record series.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMetrics {
    pub squared: Vec<f64>,
    pub root_squared: Vec<f64>,
    pub absolute: Vec<f64>,
    pub absolute_pct: Vec<f64>,
}

impl ErrorMetrics {
    pub fn len(&self) -> usize {
        self.squared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squared.is_empty()
    }

    /// Consume into named columns (`MSE`, `RMSE`, `MAE`, `MAPE`).
    pub fn into_series(self) -> Vec<NamedSeries> {
        let [mse, rmse, mae, mape] = METRIC_COLUMNS;
        vec![
            NamedSeries::new(mse, self.squared),
            NamedSeries::new(rmse, self.root_squared),
            NamedSeries::new(mae, self.absolute),
            NamedSeries::new(mape, self.absolute_pct),
        ]
    }
}

/// Compute the per-record metrics of `predicted` against `actual`.
///
/// With [`ApePolicy::Propagate`], a zero actual value yields an infinite APE
/// (`NaN` when the prediction is also exact). With [`ApePolicy::Reject`] it
/// fails with [`AppError::NumericDomain`] naming the 1-based data row.
pub fn compute_metrics(actual: &[f64], predicted: &[f64], policy: ApePolicy) -> Result<ErrorMetrics, AppError> {
    if actual.len() != predicted.len() {
        return Err(AppError::LengthMismatch {
            name: "predicted".to_string(),
            expected: actual.len(),
            actual: predicted.len(),
        });
    }

    let n = actual.len();
    let mut metrics = ErrorMetrics {
        squared: Vec::with_capacity(n),
        root_squared: Vec::with_capacity(n),
        absolute: Vec::with_capacity(n),
        absolute_pct: Vec::with_capacity(n),
    };

    for (idx, (&a, &p)) in actual.iter().zip(predicted).enumerate() {
        if a == 0.0 && policy == ApePolicy::Reject {
            return Err(AppError::NumericDomain { row: idx + 1 });
        }

        let diff = a - p;
        let se = diff * diff;
        let ae = diff.abs();

        metrics.squared.push(se);
        metrics.root_squared.push(se.sqrt());
        metrics.absolute.push(ae);
        metrics.absolute_pct.push(ae / a * 100.0);
    }

    debug!(records = n, ?policy, "metrics computed");
    Ok(metrics)
}

/// Dataset-level aggregates of an [`ErrorMetrics`] set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub n: usize,
    /// Mean of the squared errors.
    pub mse: f64,
    /// `sqrt(mse)`.
    pub rmse: f64,
    pub mae: f64,
    /// Mean of the finite percentage errors only.
    pub mape: f64,
    /// Percentage errors left out of `mape` because they were not finite.
    pub mape_excluded: usize,
}

impl MetricSummary {
    pub fn from_metrics(metrics: &ErrorMetrics) -> Self {
        let n = metrics.len();
        let mse = mean(&metrics.squared);
        let mae = mean(&metrics.absolute);

        let finite_pct: Vec<f64> = metrics
            .absolute_pct
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();

        Self {
            n,
            mse,
            rmse: mse.sqrt(),
            mae,
            mape: mean(&finite_pct),
            mape_excluded: n - finite_pct.len(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
