//! In-memory dataset storage.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use catalog_model::{Dataset, Table};

use crate::error::{Result, StorageError};
use crate::source::{DatasetSink, DatasetSource, project_canonical, project_present};

/// Keeps datasets in memory.
///
/// Used as the sink of dry runs and as the backend of tests. Reading a
/// dataset that was never inserted is a [`StorageError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<BTreeMap<Dataset, Table>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_table(mut self, dataset: Dataset, table: Table) -> Self {
        if let Ok(tables) = self.tables.get_mut() {
            tables.insert(dataset, table);
        }
        self
    }

    pub fn insert(&self, dataset: Dataset, table: Table) -> Result<()> {
        self.tables
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(dataset, table);
        Ok(())
    }

    /// Current contents of `dataset`, if any.
    pub fn get(&self, dataset: Dataset) -> Result<Option<Table>> {
        Ok(self
            .tables
            .read()
            .map_err(|_| StorageError::Poisoned)?
            .get(&dataset)
            .cloned())
    }

    /// Datasets currently held.
    pub fn datasets(&self) -> Result<Vec<Dataset>> {
        Ok(self
            .tables
            .read()
            .map_err(|_| StorageError::Poisoned)?
            .keys()
            .copied()
            .collect())
    }
}

impl DatasetSource for MemoryStorage {
    fn read(&self, dataset: Dataset) -> Result<Table> {
        let table = self.get(dataset)?.ok_or_else(|| StorageError::NotFound {
            dataset,
            location: format!("memory:{dataset}"),
        })?;
        project_canonical(&table, dataset)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl DatasetSink for MemoryStorage {
    fn write(&self, table: &Table, dataset: Dataset) -> Result<()> {
        let projected = project_present(table, dataset)?;
        debug!(dataset = %dataset, rows = projected.height(), "stored dataset in memory");
        self.insert(dataset, projected)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
