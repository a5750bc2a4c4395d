use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can surface.
///
/// All variants are fatal: the binary prints the message and exits with
/// [`AppError::exit_code`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("The file {} does not exist.", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Column '{column}' is missing in the CSV file {}.", path.display())]
    Schema { path: PathBuf, column: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid row at line {line} of {}: {message}", path.display())]
    Row {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("The CSV file {} contains no data rows.", path.display())]
    EmptyDataset { path: PathBuf },

    #[error("Series '{name}' has {actual} values, expected {expected}.")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Absolute percentage error is undefined at data row {row}: actual value is zero.")]
    NumericDomain { row: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render chart {}: {message}", path.display())]
    Render { path: PathBuf, message: String },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Process exit code for this error.
    ///
    /// - 2: bad input or configuration
    /// - 3: nothing usable in the input
    /// - 4: numeric problems while computing derived series
    /// - 5: output could not be written
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::FileNotFound { .. }
            | AppError::Schema { .. }
            | AppError::Row { .. }
            | AppError::Config(_) => 2,
            AppError::EmptyDataset { .. } => 3,
            AppError::NumericDomain { .. } | AppError::LengthMismatch { .. } => 4,
            AppError::Io { .. } | AppError::Render { .. } => 5,
        }
    }
}
