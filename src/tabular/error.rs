use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

/// Errors that can occur while reading or writing tabular files
#[derive(Debug, Error)]
pub enum TableError {
    /// Error when opening or creating a file fails
    #[error("Failed to access file: {0}")]
    IOError(#[from] std::io::Error),

    /// Error when parsing or writing a CSV file fails
    #[error("Failed to process CSV: {0}")]
    PolarsError(#[from] PolarsError),

    /// Error when a spreadsheet cannot be read
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    /// Error when writing an Excel file fails
    #[error("Failed to write Excel file: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    /// Error when the file extension is not a supported table format
    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Error when a workbook does not contain any sheet
    #[error("Workbook contains no sheets: {0}")]
    NoSheets(PathBuf),

    /// Error when a table has no header row
    #[error("Table has no header row")]
    NoHeaders,

    /// Error when a required column is missing
    #[error("Missing column {0}")]
    MissingColumn(String),
}
