//! Dataset source and sink interfaces.

use catalog_model::{Dataset, Table};

use crate::error::{Result, StorageError};

/// Reads whole datasets.
pub trait DatasetSource: Send + Sync {
    /// Return every row of `dataset`, projected to its canonical columns.
    fn read(&self, dataset: Dataset) -> Result<Table>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Persists whole datasets.
pub trait DatasetSink: Send + Sync {
    /// Persist `table` as `dataset`, dropping columns outside the canonical list.
    fn write(&self, table: &Table, dataset: Dataset) -> Result<()>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Restrict a freshly read table to the dataset's canonical columns.
///
/// Every canonical column must be present.
pub fn project_canonical(table: &Table, dataset: Dataset) -> Result<Table> {
    if let Some(missing) = dataset.columns().iter().find(|c| !table.has_column(c)) {
        return Err(StorageError::MissingColumn {
            dataset,
            column: (*missing).to_string(),
        });
    }
    Ok(table.select(dataset.columns(), false)?)
}

/// Restrict a table about to be written to the canonical columns it carries.
pub fn project_present(table: &Table, dataset: Dataset) -> Result<Table> {
    let present: Vec<&str> = dataset
        .columns()
        .iter()
        .copied()
        .filter(|column| table.has_column(column))
        .collect();
    Ok(table.select(&present, false)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::Value;

    fn professors_with_extra() -> Table {
        Table::from_rows(
            ["professor_surname", "extra", "professor_id", "professor_name"],
            vec![vec![
                Value::from("Doe"),
                Value::from("x"),
                Value::from("p1"),
                Value::from("Jane"),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_project_canonical_orders_columns() {
        let table = project_canonical(&professors_with_extra(), Dataset::Professors).unwrap();
        assert_eq!(
            table.columns(),
            ["professor_id", "professor_name", "professor_surname"]
        );
    }

    #[test]
    fn test_project_canonical_requires_every_column() {
        let table = Table::new(["professor_id"]).unwrap();
        let err = project_canonical(&table, Dataset::Professors).unwrap_err();
        assert!(matches!(
            err,
            StorageError::MissingColumn { column, .. } if column == "professor_name"
        ));
    }

    #[test]
    fn test_project_present_drops_unknown_columns() {
        let table = Table::new(["course_id", "course_id_y", "course_level"]).unwrap();
        let projected = project_present(&table, Dataset::Courses).unwrap();
        assert_eq!(projected.columns(), ["course_id", "course_level"]);
    }
}
