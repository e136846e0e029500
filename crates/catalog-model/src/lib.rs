//! Core data model for academic catalog validation.
//!
//! Provides the cell [`Value`], the row-major [`Table`] with its relational
//! primitives (joins, grouping and deduplication run on polars), the catalog
//! [`Dataset`] registry and the closed domain enums.

pub mod dataset;
pub mod enums;
pub mod error;
mod frame;
pub mod join;
pub mod table;
pub mod value;

pub use dataset::Dataset;
pub use enums::{CoursePrerequisiteType, CourseType, SemesterSeason, StageKind};
pub use error::{Result, TableError};
pub use join::{JoinHow, JoinKeys, Suffixes};
pub use table::Table;
pub use value::Value;
