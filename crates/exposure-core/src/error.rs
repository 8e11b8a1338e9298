use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the exposure reporter.
#[derive(Error, Debug)]
pub enum ExposureError {
    /// An input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required column is absent from an input table's header row.
    #[error("Missing required column \"{column}\" in the {table} table")]
    MissingColumn { table: String, column: String },

    /// A date cell did not match any recognised format.
    #[error("Invalid date in column \"{column}\", line {line}: \"{value}\"")]
    InvalidDate {
        column: String,
        line: usize,
        value: String,
    },

    /// A numeric cell could not be converted.
    #[error("Invalid number in column \"{column}\", line {line}: \"{value}\"")]
    InvalidNumber {
        column: String,
        line: usize,
        value: String,
    },

    /// A month name is not one of the twelve calendar months.
    #[error("Unknown month: {0}")]
    UnknownMonth(String),

    /// An input table contained a header row but no data rows.
    #[error("No data rows in the {0} table")]
    EmptyTable(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the exposure crates.
pub type Result<T> = std::result::Result<T, ExposureError>;
