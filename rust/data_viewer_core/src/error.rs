//! Error type shared by every fallible operation in the core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("column already exists: {0}")]
    ColumnExists(String),

    #[error("column {column}: value {value:?} in row {row} is not numeric")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column {0} has no numeric values")]
    NoNumericValues(String),

    #[error("row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("no result column to remove")]
    NoResultColumn,

    #[error("unknown aggregate: {0}")]
    UnknownAggregate(String),

    #[error("unknown filter operator: {0}")]
    UnknownFilterOp(String),

    #[error("unknown sort order: {0}")]
    UnknownSortOrder(String),

    #[error("invalid date format string: {0}")]
    InvalidDateFormat(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV error on line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
