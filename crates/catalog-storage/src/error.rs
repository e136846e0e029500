//! Error types for dataset storage.

use std::path::PathBuf;
use thiserror::Error;

use catalog_model::{Dataset, TableError};

/// Errors raised by dataset sources and sinks.
#[derive(Debug, Error)]
pub enum StorageError {
    // === File System Errors ===
    /// Dataset file does not exist.
    #[error("dataset '{dataset}' not found at {location}")]
    NotFound { dataset: Dataset, location: String },

    /// Failed to read or write a file or directory.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// Failed to parse or serialize CSV with Polars.
    #[error("CSV error for {path}: {message}")]
    Csv { path: PathBuf, message: String },

    /// A canonical column is absent from the stored dataset.
    #[error("dataset '{dataset}' is missing column '{column}'")]
    MissingColumn { dataset: Dataset, column: String },

    // === Configuration Errors ===
    /// Storage backend kind is not supported.
    #[error("unsupported storage kind '{kind}'")]
    UnsupportedKind { kind: String },

    // === Data Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Table conversion failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// In-memory store lock was poisoned by a panicking writer.
    #[error("in-memory storage lock poisoned")]
    Poisoned,
}

impl From<polars::prelude::PolarsError> for StorageError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
