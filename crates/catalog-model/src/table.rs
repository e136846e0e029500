//! Row-major in-memory table.
//!
//! A [`Table`] is an ordered list of uniquely named columns plus an ordered
//! list of rows. Every operation borrows `self` and returns a new table, so a
//! caller's table is never modified by the algebra built on top of it.
//! Deduplication, grouping and joins run on polars.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::{Result, TableError};
use crate::frame;
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        ensure_unique(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from columns and rows, checking every row's width.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TableError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Positions of several columns, in the order given.
    pub fn column_indices<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect()
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Distinct values of one column.
    pub fn distinct_values(&self, name: &str) -> Result<BTreeSet<Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Value at `row` in column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name).ok()?;
        self.rows.get(row).map(|values| &values[idx])
    }

    /// Project onto `columns` (in that order), optionally dropping duplicate rows.
    pub fn select<S: AsRef<str>>(&self, columns: &[S], drop_duplicates: bool) -> Result<Table> {
        let indices = self.column_indices(columns)?;
        let names: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        ensure_unique(&names)?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        let projected = Table {
            columns: names,
            rows,
        };
        if drop_duplicates {
            projected.drop_duplicates()
        } else {
            Ok(projected)
        }
    }

    /// Keep the first occurrence of every distinct row.
    pub fn drop_duplicates(&self) -> Result<Table> {
        let first = frame::first_positions(self)?;
        Ok(self.take_rows(&first))
    }

    /// Drop every row that contains a null.
    pub fn drop_nulls(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .filter(|row| !row.iter().any(Value::is_null))
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rename columns. Source names missing from the table are ignored.
    pub fn rename(&self, mapping: &[(String, String)]) -> Result<Table> {
        let lookup: HashMap<&str, &str> = mapping
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                lookup
                    .get(column.as_str())
                    .map_or_else(|| column.clone(), |to| (*to).to_string())
            })
            .collect();
        ensure_unique(&columns)?;
        Ok(Table {
            columns,
            rows: self.rows.clone(),
        })
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn retain_mask(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.rows.len() {
            return Err(TableError::MaskLength {
                expected: self.rows.len(),
                actual: mask.len(),
            });
        }
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Rows at the given positions, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let rows = indices
            .iter()
            .filter_map(|&idx| self.rows.get(idx).cloned())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Row positions grouped by the values of `by`.
    ///
    /// Groups are returned in order of first appearance; nulls form their own
    /// group like any other value.
    pub fn group_indices<S: AsRef<str>>(&self, by: &[S]) -> Result<Vec<Vec<usize>>> {
        let key_indices = self.column_indices(by)?;
        frame::group_positions(self, &key_indices)
    }

    /// Render up to `limit` rows as a list of value lists, for diagnostics.
    pub fn render_rows(&self, limit: usize) -> String {
        let mut out = String::from("[");
        for (pos, row) in self.rows.iter().take(limit).enumerate() {
            if pos > 0 {
                out.push_str(", ");
            }
            out.push('[');
            for (cell_pos, value) in row.iter().enumerate() {
                if cell_pos > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{value}");
            }
            out.push(']');
        }
        if self.rows.len() > limit {
            let _ = write!(out, ", ... {} more", self.rows.len() - limit);
        }
        out.push(']');
        out
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        ensure_unique(&columns)?;
        Ok(Self { columns, rows })
    }
}

fn ensure_unique(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(TableError::DuplicateColumn {
                column: column.clone(),
            });
        }
    }
    Ok(())
}
