//! Type-safe enumerations for catalog domain codes.
//!
//! The source datasets store these as upper-case strings. Parsing is
//! case-insensitive; the canonical code is always upper case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Value;

/// Semantic purpose of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    Load,
    Merge,
    Filter,
    Rename,
    Select,
    Validate,
    Store,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Load => "LOAD",
            StageKind::Merge => "MERGE",
            StageKind::Filter => "FILTER",
            StageKind::Rename => "RENAME",
            StageKind::Select => "SELECT",
            StageKind::Validate => "VALIDATE",
            StageKind::Store => "STORE",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a course is compulsory within a curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseType {
    Mandatory,
    Elective,
}

impl CourseType {
    pub const ALL: [CourseType; 2] = [CourseType::Mandatory, CourseType::Elective];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Mandatory => "MANDATORY",
            CourseType::Elective => "ELECTIVE",
        }
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MANDATORY" => Ok(CourseType::Mandatory),
            "ELECTIVE" => Ok(CourseType::Elective),
            _ => Err(format!("unknown course type: {s}")),
        }
    }
}

/// How a course's prerequisite requirement is structured.
///
/// - `One`: at least one candidate must be offered
/// - `Any`: any candidate being offered satisfies the rule
/// - `Total`: at least `minimum_required_number_of_courses` candidates must be offered
/// - `None`: no requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoursePrerequisiteType {
    None,
    One,
    Any,
    Total,
}

impl CoursePrerequisiteType {
    /// Types that carry an actual requirement.
    pub const REQUIRING: [CoursePrerequisiteType; 3] = [
        CoursePrerequisiteType::One,
        CoursePrerequisiteType::Any,
        CoursePrerequisiteType::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoursePrerequisiteType::None => "NONE",
            CoursePrerequisiteType::One => "ONE",
            CoursePrerequisiteType::Any => "ANY",
            CoursePrerequisiteType::Total => "TOTAL",
        }
    }
}

impl fmt::Display for CoursePrerequisiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoursePrerequisiteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NONE" => Ok(CoursePrerequisiteType::None),
            "ONE" => Ok(CoursePrerequisiteType::One),
            "ANY" => Ok(CoursePrerequisiteType::Any),
            "TOTAL" => Ok(CoursePrerequisiteType::Total),
            _ => Err(format!("unknown prerequisite type: {s}")),
        }
    }
}

/// Semester season of a curriculum placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemesterSeason {
    Winter,
    Summer,
}

impl SemesterSeason {
    pub const ALL: [SemesterSeason; 2] = [SemesterSeason::Winter, SemesterSeason::Summer];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemesterSeason::Winter => "WINTER",
            SemesterSeason::Summer => "SUMMER",
        }
    }
}

impl fmt::Display for SemesterSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemesterSeason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WINTER" => Ok(SemesterSeason::Winter),
            "SUMMER" => Ok(SemesterSeason::Summer),
            _ => Err(format!("unknown semester season: {s}")),
        }
    }
}

impl From<CourseType> for Value {
    fn from(value: CourseType) -> Self {
        Value::from(value.as_str())
    }
}

impl From<CoursePrerequisiteType> for Value {
    fn from(value: CoursePrerequisiteType) -> Self {
        Value::from(value.as_str())
    }
}

impl From<SemesterSeason> for Value {
    fn from(value: SemesterSeason) -> Self {
        Value::from(value.as_str())
    }
}
