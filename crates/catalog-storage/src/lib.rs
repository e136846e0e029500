//! Dataset storage for the academic catalog.
//!
//! This crate provides the two narrow interfaces the pipeline engine talks to,
//! [`DatasetSource`] and [`DatasetSink`], plus their backends.
//!
//! # Features
//!
//! - **Local CSV**: read from an input directory and write to an output directory via Polars
//! - **In-memory**: dry-run sink and test backend
//! - **Projection**: reads and writes are restricted to each dataset's canonical columns
//!
//! # Example
//!
//! ```ignore
//! use catalog_model::Dataset;
//! use catalog_storage::{StorageConfig, open_storage};
//!
//! let storage = open_storage(&StorageConfig::default())?;
//! let courses = storage.source.read(Dataset::Courses)?;
//! storage.sink.write(&courses, Dataset::Courses)?;
//! ```

mod config;
mod error;
mod frame;
mod local;
mod memory;
mod source;

// === Error Types ===
pub use error::{Result, StorageError};

// === Interfaces ===
pub use source::{DatasetSink, DatasetSource, project_canonical, project_present};

// === Backends ===
pub use config::{Storage, StorageConfig, StorageKind, open_storage};
pub use local::LocalCsvStorage;
pub use memory::MemoryStorage;

// === Polars Conversion ===
pub use frame::{any_to_value, dataframe_to_table, format_numeric, table_to_dataframe};
