//! Local filesystem CSV storage.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvReadOptions, CsvWriter, SerReader, SerWriter};
use tracing::{debug, info, warn};

use catalog_model::{Dataset, Table};

use crate::error::{Result, StorageError};
use crate::frame::{dataframe_to_table, table_to_dataframe};
use crate::source::{DatasetSink, DatasetSource, project_canonical, project_present};

/// Reads datasets from an input directory and writes them to an output directory.
///
/// A dataset file that does not exist is a [`StorageError::NotFound`] unless
/// `missing_as_empty` is set, in which case the read returns an empty table
/// with the canonical columns.
#[derive(Debug, Clone)]
pub struct LocalCsvStorage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    file_names: BTreeMap<Dataset, String>,
    missing_as_empty: bool,
}

impl LocalCsvStorage {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            file_names: BTreeMap::new(),
            missing_as_empty: false,
        }
    }

    /// Override the file name used for one dataset.
    pub fn with_file_name(mut self, dataset: Dataset, file_name: impl Into<String>) -> Self {
        self.file_names.insert(dataset, file_name.into());
        self
    }

    /// Treat missing input files as empty datasets.
    pub fn with_missing_as_empty(mut self, missing_as_empty: bool) -> Self {
        self.missing_as_empty = missing_as_empty;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_name(&self, dataset: Dataset) -> String {
        self.file_names
            .get(&dataset)
            .cloned()
            .unwrap_or_else(|| dataset.default_file_name())
    }

    pub fn input_path(&self, dataset: Dataset) -> PathBuf {
        self.input_dir.join(self.file_name(dataset))
    }

    pub fn output_path(&self, dataset: Dataset) -> PathBuf {
        self.output_dir.join(self.file_name(dataset))
    }
}

impl DatasetSource for LocalCsvStorage {
    fn read(&self, dataset: Dataset) -> Result<Table> {
        let path = self.input_path(dataset);
        if !path.exists() {
            if self.missing_as_empty {
                warn!(dataset = %dataset, path = %path.display(), "dataset file missing, using empty table");
                return Ok(Table::new(dataset.columns().iter().copied())?);
            }
            return Err(StorageError::NotFound {
                dataset,
                location: path.display().to_string(),
            });
        }

        let df = read_csv(&path)?;
        let table = project_canonical(&dataframe_to_table(&df)?, dataset)?;
        debug!(dataset = %dataset, path = %path.display(), rows = table.height(), "read dataset");
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("local:{}", self.input_dir.display())
    }
}

impl DatasetSink for LocalCsvStorage {
    fn write(&self, table: &Table, dataset: Dataset) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|source| StorageError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = self.output_path(dataset);
        let projected = project_present(table, dataset)?;
        let mut df = table_to_dataframe(&projected)?;

        let mut file = File::create(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| StorageError::Csv {
                path: path.clone(),
                message: e.to_string(),
            })?;

        info!(dataset = %dataset, path = %path.display(), rows = projected.height(), "saved dataset");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.output_dir.display())
    }
}

fn read_csv(path: &Path) -> Result<polars::prelude::DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| StorageError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| StorageError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
