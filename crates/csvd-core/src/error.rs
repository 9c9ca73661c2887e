//! Error types for the table model, the CSV codec, and the store.
//!
//! Each layer has its own enum so callers can match on exactly what can go
//! wrong at that layer. The HTTP layer maps them onto status codes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when a [`Table`](crate::Table) would violate its shape invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// A table needs at least one data column.
    #[error("table has no data columns")]
    NoColumns,

    /// Column labels must be unique within a table.
    #[error("duplicate column label '{column}'")]
    DuplicateColumn {
        /// The repeated label.
        column: String,
    },

    /// The index and the rows disagree on the row count.
    #[error("index has {index} labels but table has {rows} rows")]
    IndexLengthMismatch {
        /// Number of index labels.
        index: usize,
        /// Number of rows.
        rows: usize,
    },

    /// A row is wider or narrower than the header.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        /// Zero-based row position.
        row: usize,
        /// Number of data columns.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },

    /// Cells must be finite numbers.
    #[error("row {row}, column '{column}' holds a non-finite value")]
    NonFinite {
        /// Zero-based row position.
        row: usize,
        /// Column label.
        column: String,
    },
}

/// Errors raised while decoding CSV text into a table.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was empty or contained only whitespace.
    #[error("empty body")]
    Empty,

    /// The header holds only the index cell.
    #[error("header has no data columns")]
    NoColumns,

    /// Column labels must be unique.
    #[error("duplicate column label '{column}'")]
    DuplicateColumn {
        /// The repeated label.
        column: String,
    },

    /// A record has a different number of fields than the header.
    #[error("line {line}: expected {expected} fields, found {found}")]
    Ragged {
        /// One-based CSV line number.
        line: u64,
        /// Number of header fields.
        expected: usize,
        /// Number of fields in the record.
        found: usize,
    },

    /// A data cell is not a number.
    #[error("line {line}, column '{column}': '{value}' is not a number")]
    NonNumeric {
        /// One-based CSV line number.
        line: u64,
        /// Column label.
        column: String,
        /// The offending cell text.
        value: String,
    },

    /// A data cell parsed to NaN or an infinity.
    #[error("line {line}, column '{column}': '{value}' is not finite")]
    NonFinite {
        /// One-based CSV line number.
        line: u64,
        /// Column label.
        column: String,
        /// The offending cell text.
        value: String,
    },

    /// Invalid UTF-8 or malformed CSV syntax.
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    /// The decoded data failed table validation.
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors raised by the [`TableStore`](crate::TableStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No write has ever completed for this name.
    #[error("table '{name}' not found")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// The name is not a legal table name.
    #[error("invalid table name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The name generator gave up after too many collisions.
    #[error("could not generate a free table name after {attempts} attempts")]
    NameSpaceExhausted {
        /// Number of names tried.
        attempts: usize,
    },

    /// Reading or writing the data directory failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A persisted table could not be decoded at startup.
    #[error("corrupted table file {}: {source}", path.display())]
    Corrupted {
        /// The offending file.
        path: PathBuf,
        /// Why it failed to decode.
        source: DecodeError,
    },
}

impl StoreError {
    /// Returns true if this is a lookup miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result alias for table construction.
pub type TableResult<T> = Result<T, TableError>;

/// Result alias for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
