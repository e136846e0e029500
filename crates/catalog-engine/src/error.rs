//! Error types for pipeline execution.

use thiserror::Error;

use catalog_model::{Dataset, Table, TableError};
use catalog_storage::StorageError;

/// Number of offending rows rendered into a validation message.
const RENDERED_ROWS: usize = 20;

/// A validator rejected one or more rows.
///
/// Carries every offending row, not only the rendered prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{strategy} validation failed on column '{column}' for {count} record(s): {rows}",
    count = .invalid.height(),
    rows = .invalid.render_rows(RENDERED_ROWS)
)]
pub struct ValidationError {
    /// Name of the validator that failed.
    pub strategy: String,
    /// Column the validator checks.
    pub column: String,
    /// All rows that failed, with the input's columns.
    pub invalid: Table,
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum EngineError {
    // === Configuration Errors ===
    /// A step was configured with missing or inconsistent arguments.
    #[error("step '{step}' is misconfigured: {message}")]
    Configuration { step: String, message: String },

    /// A validator pattern does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A non-load step was handed no table.
    #[error("step '{step}' received no input table; only load steps may start a pipeline")]
    MissingInput { step: String },

    /// A load step was handed an upstream table.
    #[error("load step '{step}' received an input table")]
    UnexpectedInput { step: String },

    /// A pipeline finished without producing a table.
    #[error("pipeline '{pipeline}' produced no table")]
    EmptyPipeline { pipeline: String },

    // === Data Errors ===
    /// A validator rejected rows.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A table primitive failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A join flagged as requiring data produced no rows.
    #[error("step '{step}': join produced no rows")]
    EmptyJoin { step: String },

    /// Offerings still depend on prerequisites the configured depth did not resolve.
    #[error(
        "{dropped} offering row(s) still depend on unresolved prerequisites after {depth} closure pass(es)"
    )]
    UnresolvedPrerequisites { depth: usize, dropped: usize },

    // === I/O Errors ===
    /// Reading a dataset from the source failed.
    #[error("failed to read dataset '{dataset}': {source}")]
    SourceRead {
        dataset: Dataset,
        #[source]
        source: StorageError,
    },

    /// Writing a dataset to the sink failed.
    #[error("failed to write dataset '{dataset}': {source}")]
    SinkWrite {
        dataset: Dataset,
        #[source]
        source: StorageError,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
