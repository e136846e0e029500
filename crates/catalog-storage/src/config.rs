//! Storage backend selection.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use catalog_model::Dataset;

use crate::error::{Result, StorageError};
use crate::local::LocalCsvStorage;
use crate::memory::MemoryStorage;
use crate::source::{DatasetSink, DatasetSource};

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageKind::Local),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(StorageError::UnsupportedKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Storage settings as read from configuration.
///
/// `kind` is kept as text so an unsupported backend is reported when the
/// storage is opened rather than when the file is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: BTreeMap<Dataset, String>,
    pub missing_as_empty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Local.to_string(),
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            files: BTreeMap::new(),
            missing_as_empty: false,
        }
    }
}

/// An opened source/sink pair.
///
/// Both handles may point at the same backend object.
#[derive(Clone)]
pub struct Storage {
    pub kind: StorageKind,
    pub source: Arc<dyn DatasetSource>,
    pub sink: Arc<dyn DatasetSink>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("kind", &self.kind)
            .field("source", &self.source.describe())
            .field("sink", &self.sink.describe())
            .finish()
    }
}

impl Storage {
    /// Replace the sink, keeping the source.
    pub fn with_sink(mut self, sink: Arc<dyn DatasetSink>) -> Self {
        self.sink = sink;
        self
    }
}

/// Construct the configured backend.
pub fn open_storage(config: &StorageConfig) -> Result<Storage> {
    let kind: StorageKind = config.kind.parse()?;
    let storage = match kind {
        StorageKind::Local => {
            let local = config.files.iter().fold(
                LocalCsvStorage::new(&config.input_dir, &config.output_dir)
                    .with_missing_as_empty(config.missing_as_empty),
                |storage, (dataset, file_name)| storage.with_file_name(*dataset, file_name.clone()),
            );
            let local = Arc::new(local);
            Storage {
                kind,
                source: local.clone(),
                sink: local,
            }
        }
        StorageKind::Memory => {
            let memory = Arc::new(MemoryStorage::new());
            Storage {
                kind,
                source: memory.clone(),
                sink: memory,
            }
        }
    };
    info!(
        kind = %kind,
        source = %storage.source.describe(),
        sink = %storage.sink.describe(),
        "opened storage"
    );
    Ok(storage)
}
