//! Row filters.
//!
//! Filters compute a boolean mask over the rows of a table. Composite
//! filters evaluate both children against the same table and combine the
//! masks, so `a.and(b)` keeps exactly the rows both `a` and `b` keep.

use std::fmt;

use catalog_model::{Table, Value};

use crate::error::Result;

/// Row-subset predicate over a table. Dropped rows are not errors.
pub trait FilteringStrategy: fmt::Debug + Send + Sync {
    /// `true` for every row to keep.
    fn mask(&self, table: &Table) -> Result<Vec<bool>>;

    /// One-line description for plan rendering.
    fn describe(&self) -> String;

    /// Rows of `table` the mask keeps, in their original order.
    fn filter(&self, table: &Table) -> Result<Table> {
        let mask = self.mask(table)?;
        Ok(table.retain_mask(&mask)?)
    }
}

/// Boolean combinators for filters.
pub trait FilterExt: FilteringStrategy + Sized + 'static {
    fn and<F: FilteringStrategy + 'static>(self, other: F) -> And {
        And::new(self, other)
    }

    fn or<F: FilteringStrategy + 'static>(self, other: F) -> Or {
        Or::new(self, other)
    }
}

impl<T: FilteringStrategy + 'static> FilterExt for T {}

/// Keeps rows both children keep.
#[derive(Debug)]
pub struct And {
    left: Box<dyn FilteringStrategy>,
    right: Box<dyn FilteringStrategy>,
}

impl And {
    pub fn new(left: impl FilteringStrategy + 'static, right: impl FilteringStrategy + 'static) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl FilteringStrategy for And {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        let left = self.left.mask(table)?;
        let right = self.right.mask(table)?;
        Ok(left.into_iter().zip(right).map(|(l, r)| l && r).collect())
    }

    fn describe(&self) -> String {
        format!("({} AND {})", self.left.describe(), self.right.describe())
    }
}

/// Keeps rows either child keeps.
#[derive(Debug)]
pub struct Or {
    left: Box<dyn FilteringStrategy>,
    right: Box<dyn FilteringStrategy>,
}

impl Or {
    pub fn new(left: impl FilteringStrategy + 'static, right: impl FilteringStrategy + 'static) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl FilteringStrategy for Or {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        let left = self.left.mask(table)?;
        let right = self.right.mask(table)?;
        Ok(left.into_iter().zip(right).map(|(l, r)| l || r).collect())
    }

    fn describe(&self) -> String {
        format!("({} OR {})", self.left.describe(), self.right.describe())
    }
}

/// Keeps rows whose column is not null.
#[derive(Debug, Clone)]
pub struct NotNull {
    column: String,
}

impl NotNull {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FilteringStrategy for NotNull {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        Ok(table
            .column_values(&self.column)?
            .into_iter()
            .map(|v| !v.is_null())
            .collect())
    }

    fn describe(&self) -> String {
        format!("not_null({})", self.column)
    }
}

/// Keeps rows whose column differs from a value. Nulls differ from every value.
#[derive(Debug, Clone)]
pub struct NotEqual {
    column: String,
    value: Value,
}

impl NotEqual {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

impl FilteringStrategy for NotEqual {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        Ok(table
            .column_values(&self.column)?
            .into_iter()
            .map(|v| *v != self.value)
            .collect())
    }

    fn describe(&self) -> String {
        format!("not_equal({}, {})", self.column, self.value)
    }
}

/// Keeps every row of a group in which at least one evaluated value is not null.
#[derive(Debug, Clone)]
pub struct GroupExists {
    group_by: Vec<String>,
    evaluated: String,
}

impl GroupExists {
    pub fn new<I, S>(group_by: I, evaluated: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: group_by.into_iter().map(Into::into).collect(),
            evaluated: evaluated.into(),
        }
    }
}

impl FilteringStrategy for GroupExists {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        let evaluated = table.column_index(&self.evaluated)?;
        let mut mask = vec![false; table.height()];
        for group in table.group_indices(&self.group_by)? {
            let exists = group
                .iter()
                .any(|&row| !table.rows()[row][evaluated].is_null());
            for row in group {
                mask[row] = exists;
            }
        }
        Ok(mask)
    }

    fn describe(&self) -> String {
        format!("group_exists([{}], {})", self.group_by.join(", "), self.evaluated)
    }
}

/// Keeps every row of a group whose count of non-null evaluated values
/// reaches the group's threshold.
///
/// The threshold is the first non-null value of the threshold column in the
/// group. A group without an integer threshold is dropped.
#[derive(Debug, Clone)]
pub struct GroupHasAtLeastNMembers {
    group_by: Vec<String>,
    evaluated: String,
    threshold: String,
}

impl GroupHasAtLeastNMembers {
    pub fn new<I, S>(group_by: I, evaluated: impl Into<String>, threshold: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: group_by.into_iter().map(Into::into).collect(),
            evaluated: evaluated.into(),
            threshold: threshold.into(),
        }
    }
}

impl FilteringStrategy for GroupHasAtLeastNMembers {
    fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        let evaluated = table.column_index(&self.evaluated)?;
        let threshold = table.column_index(&self.threshold)?;
        let rows = table.rows();
        let mut mask = vec![false; table.height()];
        for group in table.group_indices(&self.group_by)? {
            let members = group
                .iter()
                .filter(|&&row| !rows[row][evaluated].is_null())
                .count();
            let required = group
                .iter()
                .map(|&row| &rows[row][threshold])
                .find(|v| !v.is_null())
                .and_then(Value::as_int);
            let keep = required.is_some_and(|n| i64::try_from(members).is_ok_and(|m| m >= n));
            for row in group {
                mask[row] = keep;
            }
        }
        Ok(mask)
    }

    fn describe(&self) -> String {
        format!(
            "group_at_least([{}], count({}) >= {})",
            self.group_by.join(", "),
            self.evaluated,
            self.threshold
        )
    }
}
