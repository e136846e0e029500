//! Run configuration: `catalog.toml`, environment and command-line overrides.
//!
//! Precedence, lowest first: built-in defaults, the configuration file,
//! environment variables (a `.env` file is loaded into the environment by the
//! binary), then flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use catalog_engine::UnresolvedPolicy;
use catalog_model::Dataset;
use catalog_storage::StorageConfig;
use catalog_validate::{CatalogRules, IdentifierFormat};

/// Configuration file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

pub const ENV_STORAGE_KIND: &str = "FILE_STORAGE_TYPE";
pub const ENV_INPUT_DIR: &str = "INPUT_DATA_DIRECTORY_PATH";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIRECTORY_PATH";

/// Environment variable naming the input file of `dataset`.
pub fn file_name_env(dataset: Dataset) -> String {
    let stem = match dataset {
        Dataset::Prerequisites => "SATISFIES".to_string(),
        Dataset::Postrequisites => "REQUIRES".to_string(),
        other => other.as_str().to_uppercase(),
    };
    format!("{stem}_DATA_INPUT_FILE_NAME")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub storage: StorageConfig,
    pub rules: CatalogRules,
}

/// Flag values that replace configured settings when present.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub closure_depth: Option<usize>,
    pub fail_on_unresolved: bool,
    pub identifier_format: Option<IdentifierFormat>,
}

impl CatalogConfig {
    /// Read `path`, or `catalog.toml` if it exists, or fall back to defaults.
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(kind) = non_empty(ENV_STORAGE_KIND) {
            self.storage.kind = kind;
        }
        if let Some(dir) = non_empty(ENV_INPUT_DIR) {
            self.storage.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(ENV_OUTPUT_DIR) {
            self.storage.output_dir = PathBuf::from(dir);
        }
        for dataset in Dataset::ALL {
            if let Some(file_name) = non_empty(&file_name_env(dataset)) {
                self.storage.files.insert(dataset, file_name);
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.input_dir {
            self.storage.input_dir = dir.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            self.storage.output_dir = dir.clone();
        }
        if let Some(depth) = overrides.closure_depth {
            self.rules.closure_depth = depth;
        }
        if overrides.fail_on_unresolved {
            self.rules.unresolved_policy = UnresolvedPolicy::Fail;
        }
        if let Some(format) = overrides.identifier_format {
            self.rules.identifier_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: CatalogConfig = toml::from_str(
            r#"
            [storage]
            kind = "local"
            input_dir = "from-file"
            "#,
        )
        .unwrap();
        let env = BTreeMap::from([
            (ENV_INPUT_DIR, "from-env"),
            (ENV_STORAGE_KIND, "memory"),
            (ENV_OUTPUT_DIR, "  "),
            ("SATISFIES_DATA_INPUT_FILE_NAME", "sat.csv"),
        ]);

        config.apply_env(|key| env.get(key).map(|value| (*value).to_string()));

        assert_eq!(config.storage.kind, "memory");
        assert_eq!(config.storage.input_dir, PathBuf::from("from-env"));
        assert_eq!(config.storage.output_dir, PathBuf::from("data/output"));
        assert_eq!(
            config.storage.files.get(&Dataset::Prerequisites).map(String::as_str),
            Some("sat.csv")
        );
    }

    #[test]
    fn test_flags_override_env() {
        let mut config = CatalogConfig::default();
        config.apply_env(|key| (key == ENV_INPUT_DIR).then(|| "from-env".to_string()));
        config.apply_overrides(&Overrides {
            input_dir: Some(PathBuf::from("from-flag")),
            closure_depth: Some(4),
            fail_on_unresolved: true,
            ..Overrides::default()
        });

        assert_eq!(config.storage.input_dir, PathBuf::from("from-flag"));
        assert_eq!(config.rules.closure_depth, 4);
        assert_eq!(config.rules.unresolved_policy, UnresolvedPolicy::Fail);
    }

    #[test]
    fn test_file_name_env() {
        assert_eq!(file_name_env(Dataset::StudyPrograms), "STUDY_PROGRAMS_DATA_INPUT_FILE_NAME");
        assert_eq!(file_name_env(Dataset::Postrequisites), "REQUIRES_DATA_INPUT_FILE_NAME");
    }
}
