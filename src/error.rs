//! Error taxonomy for the evaluation pipeline.

use std::path::PathBuf;

use crate::analyzers::types::Metric;

pub type Result<T> = std::result::Result<T, RaterError>;

#[derive(thiserror::Error, Debug)]
pub enum RaterError {
    #[error("The input must be a .xlsx file, got '{}'", .0.display())]
    Format(PathBuf),
    #[error("Station '{station}' has {found} columns, {required} are required")]
    MissingColumns {
        station: String,
        required: usize,
        found: usize,
    },
    #[error("Station '{station}', row {row}, column {column}: {reason}")]
    Schema {
        station: String,
        row: usize,
        column: usize,
        reason: String,
    },
    #[error("Connection '{destination}': cannot compute {quantity}: {reason}")]
    Arithmetic {
        destination: String,
        quantity: &'static str,
        reason: String,
    },
    #[error("Row '{destination}' has {found} values for {expected} metric columns")]
    RowWidth {
        destination: String,
        expected: usize,
        found: usize,
    },
    #[error("Column '{0}' has a mean of zero, cannot normalize")]
    ZeroMean(Metric),
    #[error("Station '{0}' has no connections")]
    EmptyStation(String),
    #[error("No weight configured for metric '{0}'")]
    UnknownMetric(Metric),
    #[error("Invalid weight table: {0}")]
    InvalidWeights(String),
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("Failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RaterError {
    pub(crate) fn arithmetic(
        destination: &str,
        quantity: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        RaterError::Arithmetic {
            destination: destination.to_string(),
            quantity,
            reason: reason.into(),
        }
    }
}
