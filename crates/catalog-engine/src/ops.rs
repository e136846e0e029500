//! Step operations and their bound arguments.
//!
//! Each operation has its own argument struct, so a step cannot be built
//! with arguments that belong to a different operation.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use catalog_model::{Dataset, JoinHow, JoinKeys, Suffixes, Table, TableError};
use catalog_storage::{DatasetSink, DatasetSource};

use crate::closure::UnresolvedPolicy;
use crate::error::{EngineError, Result};
use crate::stage::Stage;
use crate::strategy::{FilteringStrategy, ValidatorStrategy};

/// Read a dataset from a source.
#[derive(Clone)]
pub struct LoadArgs {
    pub source: Arc<dyn DatasetSource>,
    pub dataset: Dataset,
    pub drop_duplicates: bool,
}

impl LoadArgs {
    pub fn new(source: Arc<dyn DatasetSource>, dataset: Dataset) -> Self {
        Self {
            source,
            dataset,
            drop_duplicates: false,
        }
    }

    pub fn drop_duplicates(mut self) -> Self {
        self.drop_duplicates = true;
        self
    }
}

impl fmt::Debug for LoadArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadArgs")
            .field("source", &self.source.describe())
            .field("dataset", &self.dataset)
            .field("drop_duplicates", &self.drop_duplicates)
            .finish()
    }
}

/// Write the current table to a sink and pass it through unchanged.
#[derive(Clone)]
pub struct StoreArgs {
    pub sink: Arc<dyn DatasetSink>,
    pub dataset: Dataset,
    pub drop_duplicates: bool,
    pub drop_nulls: bool,
}

impl StoreArgs {
    pub fn new(sink: Arc<dyn DatasetSink>, dataset: Dataset) -> Self {
        Self {
            sink,
            dataset,
            drop_duplicates: false,
            drop_nulls: false,
        }
    }

    pub fn drop_duplicates(mut self) -> Self {
        self.drop_duplicates = true;
        self
    }

    pub fn drop_nulls(mut self) -> Self {
        self.drop_nulls = true;
        self
    }
}

impl fmt::Debug for StoreArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreArgs")
            .field("sink", &self.sink.describe())
            .field("dataset", &self.dataset)
            .field("drop_duplicates", &self.drop_duplicates)
            .field("drop_nulls", &self.drop_nulls)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SelectArgs {
    pub columns: Vec<String>,
    pub drop_duplicates: bool,
}

impl SelectArgs {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            drop_duplicates: false,
        }
    }

    pub fn drop_duplicates(mut self) -> Self {
        self.drop_duplicates = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RenameArgs {
    pub mapping: Vec<(String, String)>,
}

impl RenameArgs {
    pub fn new<I, A, B>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            mapping: mapping
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }
}

/// Join the current table (left) with a fixed table (right).
#[derive(Debug, Clone)]
pub struct MergeArgs {
    pub other: Table,
    pub keys: JoinKeys,
    pub how: JoinHow,
    pub suffixes: Suffixes,
    /// Fail the run when the join yields no rows.
    pub require_rows: bool,
}

impl MergeArgs {
    pub fn new(other: Table, keys: JoinKeys) -> Self {
        Self {
            other,
            keys,
            how: JoinHow::Inner,
            suffixes: Suffixes::default(),
            require_rows: false,
        }
    }

    pub fn on<I, S>(other: Table, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(other, JoinKeys::on(columns))
    }

    pub fn left_right<L, R, S>(other: Table, left: L, right: R) -> Self
    where
        L: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(other, JoinKeys::left_right(left, right))
    }

    pub fn how(mut self, how: JoinHow) -> Self {
        self.how = how;
        self
    }

    pub fn suffixes(mut self, suffixes: Suffixes) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn require_rows(mut self) -> Self {
        self.require_rows = true;
        self
    }
}

/// Join the current table against a deduplicated projection of itself.
#[derive(Debug, Clone)]
pub struct SelfMergeArgs {
    pub left_on: Vec<String>,
    pub right_on: Vec<String>,
    pub columns: Vec<String>,
    pub how: JoinHow,
    pub suffixes: Suffixes,
}

impl SelfMergeArgs {
    pub fn new<L, R, C, S>(left_on: L, right_on: R, columns: C) -> Self
    where
        L: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            left_on: left_on.into_iter().map(Into::into).collect(),
            right_on: right_on.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            how: JoinHow::Inner,
            suffixes: Suffixes::default(),
        }
    }

    pub fn how(mut self, how: JoinHow) -> Self {
        self.how = how;
        self
    }

    pub fn suffixes(mut self, suffixes: Suffixes) -> Self {
        self.suffixes = suffixes;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FilterArgs {
    pub strategy: Arc<dyn FilteringStrategy>,
}

impl FilterArgs {
    pub fn new(strategy: impl FilteringStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidateArgs {
    pub strategy: Arc<dyn ValidatorStrategy>,
}

impl ValidateArgs {
    pub fn new(strategy: impl ValidatorStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }
}

/// Run extra closure stages on a copy and report rows they would still drop.
#[derive(Debug, Clone)]
pub struct ConvergenceCheckArgs {
    pub stages: Vec<Stage>,
    pub depth: usize,
    pub policy: UnresolvedPolicy,
}

/// What a step does.
#[derive(Debug, Clone)]
pub enum Operation {
    Load(LoadArgs),
    Store(StoreArgs),
    Select(SelectArgs),
    Rename(RenameArgs),
    Merge(MergeArgs),
    SelfMerge(SelfMergeArgs),
    Filter(FilterArgs),
    Validate(ValidateArgs),
    ConvergenceCheck(ConvergenceCheckArgs),
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Load(_) => "load",
            Operation::Store(_) => "store",
            Operation::Select(_) => "select",
            Operation::Rename(_) => "rename",
            Operation::Merge(_) => "merge",
            Operation::SelfMerge(_) => "self_merge",
            Operation::Filter(_) => "filter",
            Operation::Validate(_) => "validate",
            Operation::ConvergenceCheck(_) => "convergence_check",
        }
    }

    /// Load operations produce a table from their arguments alone.
    pub fn is_load(&self) -> bool {
        matches!(self, Operation::Load(_))
    }

    /// One-line description for plan rendering.
    pub fn describe(&self) -> String {
        match self {
            Operation::Load(args) => {
                let dedupe = if args.drop_duplicates { " (dedupe)" } else { "" };
                format!("load {} from {}{dedupe}", args.dataset, args.source.describe())
            }
            Operation::Store(args) => format!("store {} to {}", args.dataset, args.sink.describe()),
            Operation::Select(args) => {
                let dedupe = if args.drop_duplicates { " (dedupe)" } else { "" };
                format!("select [{}]{dedupe}", args.columns.join(", "))
            }
            Operation::Rename(args) => {
                let pairs: Vec<String> = args
                    .mapping
                    .iter()
                    .map(|(from, to)| format!("{from} -> {to}"))
                    .collect();
                format!("rename {}", pairs.join(", "))
            }
            Operation::Merge(args) => format!("merge {} {}", args.how, args.keys),
            Operation::SelfMerge(args) => format!(
                "self_merge {} left_on=[{}] right_on=[{}] columns=[{}]",
                args.how,
                args.left_on.join(", "),
                args.right_on.join(", "),
                args.columns.join(", ")
            ),
            Operation::Filter(args) => format!("filter {}", args.strategy.describe()),
            Operation::Validate(args) => format!("validate {}", args.strategy.describe()),
            Operation::ConvergenceCheck(args) => format!(
                "check convergence after {} pass(es), {} extra stage(s), on unresolved: {}",
                args.depth,
                args.stages.len(),
                args.policy
            ),
        }
    }

    /// Produce the table of a load operation.
    pub(crate) fn load(&self, step: &str) -> Result<Table> {
        match self {
            Operation::Load(args) => {
                let table = args
                    .source
                    .read(args.dataset)
                    .map_err(|source| EngineError::SourceRead {
                        dataset: args.dataset,
                        source,
                    })?;
                if args.drop_duplicates {
                    Ok(table.drop_duplicates()?)
                } else {
                    Ok(table)
                }
            }
            _ => Err(EngineError::MissingInput {
                step: step.to_string(),
            }),
        }
    }

    /// Apply a non-load operation to the upstream table.
    pub(crate) fn apply(&self, step: &str, table: Table) -> Result<Table> {
        match self {
            Operation::Load(_) => Err(EngineError::UnexpectedInput {
                step: step.to_string(),
            }),
            Operation::Store(args) => {
                let mut stored = table.clone();
                if args.drop_duplicates {
                    stored = stored.drop_duplicates()?;
                }
                if args.drop_nulls {
                    stored = stored.drop_nulls();
                }
                args.sink
                    .write(&stored, args.dataset)
                    .map_err(|source| EngineError::SinkWrite {
                        dataset: args.dataset,
                        source,
                    })?;
                Ok(table)
            }
            Operation::Select(args) => Ok(table.select(&args.columns, args.drop_duplicates)?),
            Operation::Rename(args) => Ok(table.rename(&args.mapping)?),
            Operation::Merge(args) => {
                let joined = table
                    .join(&args.other, &args.keys, args.how, &args.suffixes)
                    .map_err(|err| join_error(step, err))?;
                if args.require_rows && joined.is_empty() {
                    return Err(EngineError::EmptyJoin {
                        step: step.to_string(),
                    });
                }
                Ok(joined)
            }
            Operation::SelfMerge(args) => {
                let lookup = table.select(&args.columns, true)?;
                let keys = JoinKeys::LeftRight {
                    left: args.left_on.clone(),
                    right: args.right_on.clone(),
                };
                table
                    .join(&lookup, &keys, args.how, &args.suffixes)
                    .map_err(|err| join_error(step, err))
            }
            Operation::Filter(args) => args.strategy.filter(&table),
            Operation::Validate(args) => args.strategy.validate(table),
            Operation::ConvergenceCheck(args) => {
                let mut data = Some(table.clone());
                for stage in &args.stages {
                    data = stage.run(data)?;
                }
                let remaining = data.map_or(0, |t| t.height());
                let dropped = table.height().saturating_sub(remaining);
                if dropped == 0 {
                    debug!(step, depth = args.depth, "prerequisite closure converged");
                    return Ok(table);
                }
                match args.policy {
                    UnresolvedPolicy::Warn => {
                        warn!(
                            step,
                            depth = args.depth,
                            dropped,
                            "prerequisite chains are deeper than the closure depth"
                        );
                        Ok(table)
                    }
                    UnresolvedPolicy::Fail => Err(EngineError::UnresolvedPrerequisites {
                        depth: args.depth,
                        dropped,
                    }),
                }
            }
        }
    }
}

/// Missing or inconsistent join keys are a configuration problem of the step.
fn join_error(step: &str, err: TableError) -> EngineError {
    match err {
        TableError::InvalidJoin { reason } => EngineError::Configuration {
            step: step.to_string(),
            message: reason,
        },
        other => EngineError::Table(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::Value;

    fn offers() -> Table {
        Table::from_rows(
            ["curriculum_id", "study_program_id"],
            vec![
                vec![Value::from("cu1"), Value::from("p1")],
                vec![Value::from("cu1"), Value::from("p1")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_merge_without_keys_is_a_configuration_error() {
        let op = Operation::Merge(MergeArgs::new(offers(), JoinKeys::On(vec![])));
        let err = op.apply("merge-offers", offers()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration { step, .. } if step == "merge-offers"
        ));
    }

    #[test]
    fn test_merge_require_rows() {
        let empty = Table::new(["curriculum_id", "course_id"]).unwrap();
        let op = Operation::Merge(MergeArgs::on(empty, ["curriculum_id"]).require_rows());
        let err = op.apply("merge-includes", offers()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyJoin { .. }));
    }

    #[test]
    fn test_self_merge_uses_deduplicated_lookup() {
        let op = Operation::SelfMerge(
            SelfMergeArgs::new(
                ["curriculum_id"],
                ["curriculum_id"],
                ["curriculum_id", "study_program_id"],
            )
            .how(JoinHow::Left),
        );
        let merged = op.apply("self-merge", offers()).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(
            merged.columns(),
            ["curriculum_id", "study_program_id_x", "study_program_id_y"]
        );
    }

    #[test]
    fn test_describe() {
        let op = Operation::Select(SelectArgs::new(["course_id", "course_level"]).drop_duplicates());
        assert_eq!(op.describe(), "select [course_id, course_level] (dedupe)");
        let op = Operation::Rename(RenameArgs::new([("course_id_x", "course_id")]));
        assert_eq!(op.describe(), "rename course_id_x -> course_id");
    }
}
