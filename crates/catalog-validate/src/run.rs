//! Whole-catalog run.
//!
//! Datasets are validated in dependency order. Each pipeline's output is the
//! reference data for the pipelines after it, so a dataset is only checked
//! against rows that already passed.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, info_span};

use catalog_engine::Pipeline;
use catalog_model::{Dataset, Table};
use catalog_storage::{DatasetSource, StorageError};

use crate::context::CatalogContext;
use crate::error::{CatalogError, Result};
use crate::pipelines::CurriculaReferences;

/// Row counts of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub dataset: Dataset,
    /// Rows read from the source, duplicates included.
    pub input_rows: usize,
    /// Rows written to the sink.
    pub stored_rows: usize,
}

impl DatasetSummary {
    /// Rows removed by deduplication, filters and the prerequisite closure.
    pub fn removed_rows(&self) -> usize {
        self.input_rows.saturating_sub(self.stored_rows)
    }
}

/// Outcome of a successful catalog run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    /// In run order.
    pub datasets: Vec<DatasetSummary>,
    pub closure_depth: usize,
    pub elapsed_ms: u64,
}

impl CatalogSummary {
    pub fn get(&self, dataset: Dataset) -> Option<&DatasetSummary> {
        self.datasets.iter().find(|summary| summary.dataset == dataset)
    }

    pub fn total_stored_rows(&self) -> usize {
        self.datasets.iter().map(|summary| summary.stored_rows).sum()
    }
}

/// Source that reads each dataset from `inner` once and serves copies after.
///
/// The load step of a pipeline and the run's own row counts and reference
/// tables all go through it, so a dataset is never read twice in one run.
struct ReadOnce {
    inner: Arc<dyn DatasetSource>,
    tables: RwLock<BTreeMap<Dataset, Table>>,
}

impl ReadOnce {
    fn new(inner: Arc<dyn DatasetSource>) -> Self {
        Self {
            inner,
            tables: RwLock::new(BTreeMap::new()),
        }
    }
}

impl DatasetSource for ReadOnce {
    fn read(&self, dataset: Dataset) -> catalog_storage::Result<Table> {
        if let Some(table) = self
            .tables
            .read()
            .map_err(|_| StorageError::Poisoned)?
            .get(&dataset)
        {
            return Ok(table.clone());
        }
        let table = self.inner.read(dataset)?;
        self.tables
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(dataset, table.clone());
        Ok(table)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Bookkeeping for one run: the shared source and finished datasets.
struct CatalogRun {
    source: Arc<ReadOnce>,
    finished: Vec<DatasetSummary>,
}

impl CatalogRun {
    fn new(source: Arc<ReadOnce>) -> Self {
        Self {
            source,
            finished: Vec::new(),
        }
    }

    /// Raw rows of `dataset`, duplicates included.
    fn raw(&self, dataset: Dataset) -> Result<Table> {
        self.source
            .read(dataset)
            .map_err(|source| CatalogError::Reference { dataset, source })
    }

    fn execute(
        &mut self,
        dataset: Dataset,
        assembled: catalog_engine::Result<Pipeline>,
    ) -> Result<Table> {
        let pipeline = assembled.map_err(|source| CatalogError::Assemble { dataset, source })?;
        let input_rows = self.raw(dataset)?.height();
        let table = pipeline
            .build()
            .run()
            .map_err(|source| CatalogError::Pipeline { dataset, source })?;
        info!(
            dataset = %dataset,
            input_rows,
            stored_rows = table.height(),
            "dataset validated"
        );
        self.finished.push(DatasetSummary {
            dataset,
            input_rows,
            stored_rows: table.height(),
        });
        Ok(table)
    }
}

/// Validate and store every catalog dataset.
///
/// Stops at the first failing pipeline. Datasets stored before the failure
/// stay in the sink.
pub fn run_catalog(ctx: &CatalogContext) -> Result<CatalogSummary> {
    ctx.rules.check()?;
    let span = info_span!(
        "catalog",
        source = %ctx.source.describe(),
        sink = %ctx.sink.describe()
    );
    let _guard = span.enter();
    let start = Instant::now();
    info!(
        closure_depth = ctx.rules.closure_depth,
        identifier_format = %ctx.rules.identifier_format,
        "catalog run started"
    );

    let source = Arc::new(ReadOnce::new(ctx.source.clone()));
    let ctx = &CatalogContext {
        source: source.clone(),
        ..ctx.clone()
    };
    let mut run = CatalogRun::new(source);

    let courses = run.execute(Dataset::Courses, ctx.courses_pipeline())?;
    let professors = run.execute(Dataset::Professors, ctx.professors_pipeline())?;
    let study_programs = run.execute(Dataset::StudyPrograms, ctx.study_programs_pipeline())?;
    run.execute(
        Dataset::Teaches,
        ctx.teaches_pipeline(&courses, &professors),
    )?;

    let requisites = run.execute(Dataset::Requisites, ctx.requisites_pipeline())?;
    let raw_requisites = run.raw(Dataset::Requisites)?;
    let requires = run.raw(Dataset::Postrequisites)?;
    let satisfies = run.raw(Dataset::Prerequisites)?;
    let offers = run.raw(Dataset::Offers)?;
    let includes = run.raw(Dataset::Includes)?;
    let curricula = run.execute(
        Dataset::Curricula,
        ctx.curricula_pipeline(CurriculaReferences {
            requisites: &requisites,
            requires: &requires,
            satisfies: &satisfies,
            offers: &offers,
            includes: &includes,
        }),
    )?;

    run.execute(Dataset::Includes, ctx.includes_pipeline(&curricula, &courses))?;
    run.execute(
        Dataset::Offers,
        ctx.offers_pipeline(&curricula, &study_programs),
    )?;
    run.execute(
        Dataset::Prerequisites,
        ctx.prerequisites_pipeline(&raw_requisites, &requisites, &courses),
    )?;
    run.execute(
        Dataset::Postrequisites,
        ctx.postrequisites_pipeline(&curricula, &raw_requisites, &requisites),
    )?;

    let summary = CatalogSummary {
        datasets: run.finished,
        closure_depth: ctx.rules.closure_depth,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        datasets = summary.datasets.len(),
        stored_rows = summary.total_stored_rows(),
        elapsed_ms = summary.elapsed_ms,
        "catalog run finished"
    );
    Ok(summary)
}
