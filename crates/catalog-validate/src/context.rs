//! Source, sink and rules shared by every catalog pipeline.

use std::fmt;
use std::sync::Arc;

use catalog_storage::{DatasetSink, DatasetSource, Storage};

use crate::rules::CatalogRules;

/// Everything a pipeline factory needs besides upstream tables.
#[derive(Clone)]
pub struct CatalogContext {
    pub(crate) source: Arc<dyn DatasetSource>,
    pub(crate) sink: Arc<dyn DatasetSink>,
    pub(crate) rules: CatalogRules,
}

impl fmt::Debug for CatalogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogContext")
            .field("source", &self.source.describe())
            .field("sink", &self.sink.describe())
            .field("rules", &self.rules)
            .finish()
    }
}

impl CatalogContext {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        sink: Arc<dyn DatasetSink>,
        rules: CatalogRules,
    ) -> Self {
        Self {
            source,
            sink,
            rules,
        }
    }

    pub fn from_storage(storage: &Storage, rules: CatalogRules) -> Self {
        Self::new(storage.source.clone(), storage.sink.clone(), rules)
    }

    pub fn source(&self) -> &Arc<dyn DatasetSource> {
        &self.source
    }

    pub fn sink(&self) -> &Arc<dyn DatasetSink> {
        &self.sink
    }

    pub fn rules(&self) -> &CatalogRules {
        &self.rules
    }
}
