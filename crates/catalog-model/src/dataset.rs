//! Catalog datasets and their canonical column order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named input/output dataset of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    StudyPrograms,
    Courses,
    Professors,
    Curricula,
    Requisites,
    Offers,
    Includes,
    /// Candidate courses that satisfy a requisite (`satisfies` relation).
    Prerequisites,
    /// Requisites a curriculum entry requires (`requires` relation).
    Postrequisites,
    Teaches,
}

const STUDY_PROGRAMS_COLUMNS: &[&str] = &[
    "study_program_id",
    "study_program_code",
    "study_program_name",
    "study_program_duration",
    "study_program_url",
];

const COURSES_COLUMNS: &[&str] = &[
    "course_id",
    "course_code",
    "course_name_mk",
    "course_name_en",
    "course_url",
    "course_level",
];

const PROFESSORS_COLUMNS: &[&str] = &["professor_id", "professor_name", "professor_surname"];

const CURRICULA_COLUMNS: &[&str] = &[
    "curriculum_id",
    "course_type",
    "course_semester_season",
    "course_academic_year",
    "course_semester",
];

const REQUISITES_COLUMNS: &[&str] = &[
    "requisite_id",
    "course_prerequisite_type",
    "minimum_required_number_of_courses",
];

const OFFERS_COLUMNS: &[&str] = &["offers_id", "curriculum_id", "study_program_id"];

const INCLUDES_COLUMNS: &[&str] = &["includes_id", "curriculum_id", "course_id"];

const PREREQUISITES_COLUMNS: &[&str] = &["satisfies_id", "prerequisite_course_id", "requisite_id"];

const POSTREQUISITES_COLUMNS: &[&str] = &["requires_id", "curriculum_id", "requisite_id"];

const TEACHES_COLUMNS: &[&str] = &["teaches_id", "course_id", "professor_id"];

impl Dataset {
    /// Every dataset, in the order the catalog run processes them.
    pub const ALL: [Dataset; 10] = [
        Dataset::Courses,
        Dataset::Professors,
        Dataset::StudyPrograms,
        Dataset::Teaches,
        Dataset::Requisites,
        Dataset::Curricula,
        Dataset::Includes,
        Dataset::Offers,
        Dataset::Prerequisites,
        Dataset::Postrequisites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::StudyPrograms => "study_programs",
            Dataset::Courses => "courses",
            Dataset::Professors => "professors",
            Dataset::Curricula => "curricula",
            Dataset::Requisites => "requisites",
            Dataset::Offers => "offers",
            Dataset::Includes => "includes",
            Dataset::Prerequisites => "prerequisites",
            Dataset::Postrequisites => "postrequisites",
            Dataset::Teaches => "teaches",
        }
    }

    /// Canonical ordered column list. Sources project to it, sinks drop
    /// anything outside it.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::StudyPrograms => STUDY_PROGRAMS_COLUMNS,
            Dataset::Courses => COURSES_COLUMNS,
            Dataset::Professors => PROFESSORS_COLUMNS,
            Dataset::Curricula => CURRICULA_COLUMNS,
            Dataset::Requisites => REQUISITES_COLUMNS,
            Dataset::Offers => OFFERS_COLUMNS,
            Dataset::Includes => INCLUDES_COLUMNS,
            Dataset::Prerequisites => PREREQUISITES_COLUMNS,
            Dataset::Postrequisites => POSTREQUISITES_COLUMNS,
            Dataset::Teaches => TEACHES_COLUMNS,
        }
    }

    /// The identifier column (always the first canonical column).
    pub fn id_column(&self) -> &'static str {
        self.columns()[0]
    }

    /// Default file name used by file-based storage.
    pub fn default_file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "study_programs" => Ok(Dataset::StudyPrograms),
            "courses" => Ok(Dataset::Courses),
            "professors" => Ok(Dataset::Professors),
            "curricula" => Ok(Dataset::Curricula),
            "requisites" => Ok(Dataset::Requisites),
            "offers" => Ok(Dataset::Offers),
            "includes" => Ok(Dataset::Includes),
            "prerequisites" | "satisfies" => Ok(Dataset::Prerequisites),
            "postrequisites" | "requires" => Ok(Dataset::Postrequisites),
            "teaches" => Ok(Dataset::Teaches),
            _ => Err(format!("unknown dataset: {s}")),
        }
    }
}
