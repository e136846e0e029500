//! Pipeline execution engine for catalog validation.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s, each an ordered list of
//! [`Step`]s. Every step binds one [`Operation`] to its arguments and turns
//! the upstream table into a new one:
//!
//! - **Load / Store**: read from a [`DatasetSource`](catalog_storage::DatasetSource),
//!   write to a [`DatasetSink`](catalog_storage::DatasetSink)
//! - **Select / Rename / Merge / SelfMerge**: table algebra
//! - **Filter**: drop rows with a [`FilteringStrategy`]
//! - **Validate**: reject the run with a [`ValidatorStrategy`]
//!
//! [`PrerequisiteClosure`] assembles the stage groups that drop curriculum
//! offerings whose prerequisite rules cannot be met.

pub mod closure;
pub mod error;
pub mod ops;
pub mod pipeline;
pub mod stage;
pub mod step;
pub mod strategy;

pub use closure::{PrerequisiteClosure, UnresolvedPolicy};
pub use error::{EngineError, Result, ValidationError};
pub use ops::{
    ConvergenceCheckArgs, FilterArgs, LoadArgs, MergeArgs, Operation, RenameArgs, SelectArgs,
    SelfMergeArgs, StoreArgs, ValidateArgs,
};
pub use pipeline::{BuiltPipeline, Pipeline, PipelineState};
pub use stage::Stage;
pub use step::Step;
pub use strategy::{
    And, ChoiceValidator, FilterExt, FilteringStrategy, GroupExists, GroupHasAtLeastNMembers,
    NotEqual, NotNull, Or, RangeValidator, RegexValidator, UrlValidator, UuidValidator,
    ValidatorStrategy,
};
