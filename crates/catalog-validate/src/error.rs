//! Error types for the catalog run.

use thiserror::Error;

use catalog_engine::EngineError;
use catalog_model::Dataset;
use catalog_storage::StorageError;

/// Errors raised while assembling or running the catalog pipelines.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A rule override is unusable.
    #[error("invalid rule '{rule}': {message}")]
    InvalidRule { rule: &'static str, message: String },

    /// A pipeline could not be assembled.
    #[error("failed to assemble the {dataset} pipeline: {source}")]
    Assemble {
        dataset: Dataset,
        #[source]
        source: EngineError,
    },

    /// A pipeline run aborted.
    #[error("{dataset} pipeline failed: {source}")]
    Pipeline {
        dataset: Dataset,
        #[source]
        source: EngineError,
    },

    /// A dataset needed as reference data could not be read.
    #[error("failed to read {dataset} reference data: {source}")]
    Reference {
        dataset: Dataset,
        #[source]
        source: StorageError,
    },
}

impl CatalogError {
    /// Dataset whose pipeline or reference read failed, if any.
    pub fn dataset(&self) -> Option<Dataset> {
        match self {
            CatalogError::InvalidRule { .. } => None,
            CatalogError::Assemble { dataset, .. }
            | CatalogError::Pipeline { dataset, .. }
            | CatalogError::Reference { dataset, .. } => Some(*dataset),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
