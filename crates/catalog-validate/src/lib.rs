//! Catalog validation pipelines.
//!
//! This crate wires the engine's generic steps into one pipeline per catalog
//! dataset and runs them in dependency order.
//!
//! # Features
//!
//! - **Rules**: allowed codes, levels, ranges and identifier format in [`CatalogRules`]
//! - **Pipelines**: factories on [`CatalogContext`] for each dataset
//! - **Run**: [`run_catalog`] validates and stores everything, returning a [`CatalogSummary`]
//!
//! # Example
//!
//! ```ignore
//! use catalog_storage::{open_storage, StorageConfig};
//! use catalog_validate::{run_catalog, CatalogContext, CatalogRules};
//!
//! let storage = open_storage(&StorageConfig::default())?;
//! let ctx = CatalogContext::from_storage(&storage, CatalogRules::default());
//! let summary = run_catalog(&ctx)?;
//! ```

mod context;
mod error;
mod pipelines;
mod rules;
mod run;

// === Context ===
pub use context::CatalogContext;

// === Errors ===
pub use error::{CatalogError, Result};

// === Pipelines ===
pub use pipelines::CurriculaReferences;

// === Rules ===
pub use rules::{CatalogRules, IdentifierFormat, TOKEN_PATTERN};

// === Run ===
pub use run::{CatalogSummary, DatasetSummary, run_catalog};
