//! Error types for table operations.

use thiserror::Error;

/// Errors raised by [`Table`](crate::Table) primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A referenced column does not exist.
    #[error("column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A column name appears more than once.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// A row does not match the table width.
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A boolean mask does not match the table height.
    #[error("mask has {actual} entries, table has {expected} rows")]
    MaskLength { expected: usize, actual: usize },

    /// Join keys are missing or inconsistent.
    #[error("invalid join: {reason}")]
    InvalidJoin { reason: String },

    /// A polars kernel failed.
    #[error("dataframe operation failed: {message}")]
    Frame { message: String },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
