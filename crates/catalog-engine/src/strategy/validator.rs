//! Column validators.
//!
//! A validator checks every row of one column and either returns the table
//! unchanged or fails with a [`ValidationError`] carrying all offending rows.
//! Nulls are invalid for every validator unless a choice set lists null.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use regex::Regex;
use url::Url;
use uuid::Uuid;

use catalog_model::{Table, Value};

use crate::error::{EngineError, Result, ValidationError};

/// Schemes accepted by [`UrlValidator`].
const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// All-or-nothing row predicate over one column.
pub trait ValidatorStrategy: fmt::Debug + Send + Sync {
    /// Stable strategy name reported in errors.
    fn name(&self) -> &'static str;

    /// Column the predicate reads.
    fn column(&self) -> &str;

    /// Whether a single cell passes.
    fn is_valid(&self, value: &Value) -> bool;

    /// One-line description for plan rendering.
    fn describe(&self) -> String;

    /// Check every row; return the table unchanged when all pass.
    fn validate(&self, table: Table) -> Result<Table> {
        let idx = table.column_index(self.column())?;
        let invalid: Vec<usize> = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| !self.is_valid(&row[idx]))
            .map(|(pos, _)| pos)
            .collect();
        if invalid.is_empty() {
            return Ok(table);
        }
        Err(EngineError::Validation(ValidationError {
            strategy: self.name().to_string(),
            column: self.column().to_string(),
            invalid: table.take_rows(&invalid),
        }))
    }
}

/// Cell must be a string matching a pattern at its start.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    column: String,
    pattern: Regex,
}

impl RegexValidator {
    pub fn new(column: impl Into<String>, pattern: Regex) -> Self {
        Self {
            column: column.into(),
            pattern,
        }
    }

    /// Compile `pattern` and build the validator.
    pub fn from_pattern(column: impl Into<String>, pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|source| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::new(column, compiled))
    }
}

impl ValidatorStrategy for RegexValidator {
    fn name(&self) -> &'static str {
        "RegexValidator"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn is_valid(&self, value: &Value) -> bool {
        value
            .as_str()
            .and_then(|s| self.pattern.find(s))
            .is_some_and(|m| m.start() == 0)
    }

    fn describe(&self) -> String {
        format!("regex({}, {})", self.column, self.pattern.as_str())
    }
}

/// Cell must be an absolute web or ftp URL with a host.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    column: String,
}

impl UrlValidator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl ValidatorStrategy for UrlValidator {
    fn name(&self) -> &'static str {
        "UrlValidator"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn is_valid(&self, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            return false;
        };
        match Url::parse(text.trim()) {
            Ok(url) => {
                URL_SCHEMES.contains(&url.scheme()) && url.host_str().is_some_and(|h| !h.is_empty())
            }
            Err(_) => false,
        }
    }

    fn describe(&self) -> String {
        format!("url({})", self.column)
    }
}

/// Cell must parse as a UUID.
#[derive(Debug, Clone)]
pub struct UuidValidator {
    column: String,
}

impl UuidValidator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl ValidatorStrategy for UuidValidator {
    fn name(&self) -> &'static str {
        "UuidValidator"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok())
    }

    fn describe(&self) -> String {
        format!("uuid({})", self.column)
    }
}

/// Cell must be one of a fixed set of values.
///
/// Comparison is raw value equality: strings are case-sensitive and an
/// integer never equals its string spelling.
#[derive(Debug, Clone)]
pub struct ChoiceValidator {
    column: String,
    values: BTreeSet<Value>,
}

impl ChoiceValidator {
    pub fn new<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Allowed values are the distinct values of `reference_column` in `reference`.
    ///
    /// Used for foreign-key checks against an already validated table.
    pub fn from_column(
        column: impl Into<String>,
        reference: &Table,
        reference_column: &str,
    ) -> Result<Self> {
        let values = reference.distinct_values(reference_column)?;
        Ok(Self {
            column: column.into(),
            values,
        })
    }

    pub fn values(&self) -> &BTreeSet<Value> {
        &self.values
    }
}

impl ValidatorStrategy for ChoiceValidator {
    fn name(&self) -> &'static str {
        "ChoiceValidator"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn is_valid(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    fn describe(&self) -> String {
        if self.values.len() <= 4 {
            let shown: Vec<String> = self.values.iter().map(ToString::to_string).collect();
            format!("choice({}, {{{}}})", self.column, shown.join(", "))
        } else {
            format!("choice({}, {} values)", self.column, self.values.len())
        }
    }
}

/// Cell must be an integer in `min..=max`.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    column: String,
    min: i64,
    max: i64,
}

impl RangeValidator {
    /// Inclusive on both bounds.
    pub fn new(column: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            column: column.into(),
            min,
            max,
        }
    }

    /// Build from an inclusive range; both ends are accepted.
    pub fn from_range(column: impl Into<String>, range: RangeInclusive<i64>) -> Self {
        Self::new(column, *range.start(), *range.end())
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

impl ValidatorStrategy for RangeValidator {
    fn name(&self) -> &'static str {
        "RangeValidator"
    }

    fn column(&self) -> &str {
        &self.column
    }

    fn is_valid(&self, value: &Value) -> bool {
        value
            .as_int()
            .is_some_and(|v| (self.min..=self.max).contains(&v))
    }

    fn describe(&self) -> String {
        format!("range({}, {}..={})", self.column, self.min, self.max)
    }
}
