//! Domain rules applied by the catalog pipelines.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use catalog_engine::{
    PrerequisiteClosure, RegexValidator, UnresolvedPolicy, UuidValidator, ValidateArgs,
};
use catalog_model::{CoursePrerequisiteType, CourseType, SemesterSeason};

use crate::error::{CatalogError, Result};

/// Pattern of a plain identifier token.
pub const TOKEN_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_-]*$";

/// How primary-key columns are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierFormat {
    /// Alphanumeric token with `_` and `-`.
    #[default]
    Token,
    /// RFC 4122 UUID in any textual form.
    Uuid,
}

impl IdentifierFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierFormat::Token => "token",
            IdentifierFormat::Uuid => "uuid",
        }
    }

    /// Validation step arguments for `column`.
    pub fn validator(&self, column: &str) -> catalog_engine::Result<ValidateArgs> {
        Ok(match self {
            IdentifierFormat::Token => {
                ValidateArgs::new(RegexValidator::from_pattern(column, TOKEN_PATTERN)?)
            }
            IdentifierFormat::Uuid => ValidateArgs::new(UuidValidator::new(column)),
        })
    }
}

impl fmt::Display for IdentifierFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(IdentifierFormat::Token),
            "uuid" => Ok(IdentifierFormat::Uuid),
            _ => Err(format!("unknown identifier format: {s}")),
        }
    }
}

/// Allowed values and limits for catalog columns.
///
/// Every field has a default, so a configuration file only lists the rules
/// it overrides. Ranges include both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRules {
    pub course_code_pattern: String,
    pub study_program_code_pattern: String,
    pub course_levels: BTreeSet<i64>,
    pub study_program_durations: BTreeSet<i64>,
    pub prerequisite_types: Vec<CoursePrerequisiteType>,
    pub minimum_required_courses: RangeInclusive<i64>,
    pub course_types: Vec<CourseType>,
    pub semester_seasons: Vec<SemesterSeason>,
    pub academic_years: RangeInclusive<i64>,
    pub semesters: RangeInclusive<i64>,
    pub identifier_format: IdentifierFormat,
    pub closure_depth: usize,
    pub unresolved_policy: UnresolvedPolicy,
}

impl Default for CatalogRules {
    fn default() -> Self {
        Self {
            course_code_pattern: r"^F23L[1-3][SW]\d{3}$".to_string(),
            study_program_code_pattern: r"^[A-Z]{2,4}\d{1}$".to_string(),
            course_levels: BTreeSet::from([1, 2, 3]),
            study_program_durations: BTreeSet::from([2, 3, 4]),
            prerequisite_types: CoursePrerequisiteType::REQUIRING.to_vec(),
            minimum_required_courses: 0..=39,
            course_types: CourseType::ALL.to_vec(),
            semester_seasons: SemesterSeason::ALL.to_vec(),
            academic_years: 1..=4,
            semesters: 1..=8,
            identifier_format: IdentifierFormat::default(),
            closure_depth: PrerequisiteClosure::DEFAULT_DEPTH,
            unresolved_policy: UnresolvedPolicy::default(),
        }
    }
}

impl CatalogRules {
    /// Reject rule sets that would make every row invalid.
    pub fn check(&self) -> Result<()> {
        check_range("minimum_required_courses", &self.minimum_required_courses)?;
        check_range("academic_years", &self.academic_years)?;
        check_range("semesters", &self.semesters)?;
        check_non_empty("course_levels", self.course_levels.len())?;
        check_non_empty("study_program_durations", self.study_program_durations.len())?;
        check_non_empty("prerequisite_types", self.prerequisite_types.len())?;
        check_non_empty("course_types", self.course_types.len())?;
        check_non_empty("semester_seasons", self.semester_seasons.len())?;
        Ok(())
    }
}

fn check_range(rule: &'static str, range: &RangeInclusive<i64>) -> Result<()> {
    if range.is_empty() {
        return Err(CatalogError::InvalidRule {
            rule,
            message: format!("range {}..={} is empty", range.start(), range.end()),
        });
    }
    Ok(())
}

fn check_non_empty(rule: &'static str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(CatalogError::InvalidRule {
            rule,
            message: "no allowed values".to_string(),
        });
    }
    Ok(())
}
