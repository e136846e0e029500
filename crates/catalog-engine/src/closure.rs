//! Prerequisite closure over curriculum offerings.
//!
//! An offering is one curriculum placement of a course within a study
//! program. A course may declare a requisite (`ONE`, `ANY` or `TOTAL` of a set
//! of candidate courses). A pass of the closure:
//!
//! 1. attaches each offering's requisite and its candidate courses,
//! 2. self-joins the candidates against the offerings of the same program,
//!    so a matched row means the candidate is actually offered,
//! 3. drops offerings whose rule is not met,
//! 4. restores the offering shape.
//!
//! Dropping an offering can invalidate offerings that depend on it, so the
//! pass is repeated `depth` times. A final check runs one more pass on a copy
//! and reports offerings that would still be dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use catalog_model::{CoursePrerequisiteType, Dataset, JoinHow, StageKind, Table};

use crate::ops::{
    ConvergenceCheckArgs, FilterArgs, MergeArgs, Operation, RenameArgs, SelectArgs, SelfMergeArgs,
};
use crate::pipeline::Pipeline;
use crate::stage::Stage;
use crate::step::Step;
use crate::strategy::{FilterExt, FilteringStrategy, GroupExists, GroupHasAtLeastNMembers, NotEqual, NotNull};

const CURRICULUM_ID: &str = "curriculum_id";
const REQUISITE_ID: &str = "requisite_id";
const STUDY_PROGRAM_ID: &str = "study_program_id";
const COURSE_ID: &str = "course_id";
const PREREQUISITE_COURSE_ID: &str = "prerequisite_course_id";
const PREREQUISITE_TYPE: &str = "course_prerequisite_type";
const MINIMUM_REQUIRED: &str = "minimum_required_number_of_courses";
/// Offered course after the self-join (left side).
const OFFERED_COURSE: &str = "course_id_x";
/// Matched candidate course after the self-join (right side).
const MATCHED_CANDIDATE: &str = "course_id_y";

/// What to do when offerings still depend on unresolved prerequisites after
/// the configured depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Log a warning and keep going.
    #[default]
    Warn,
    /// Abort the run.
    Fail,
}

impl UnresolvedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Warn => "warn",
            UnresolvedPolicy::Fail => "fail",
        }
    }
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(UnresolvedPolicy::Warn),
            "fail" => Ok(UnresolvedPolicy::Fail),
            _ => Err(format!("unknown unresolved policy: {s}")),
        }
    }
}

/// Builder of the closure stages.
#[derive(Debug, Clone)]
pub struct PrerequisiteClosure {
    requires: Table,
    requisites: Table,
    satisfies: Table,
    depth: usize,
    policy: UnresolvedPolicy,
}

impl PrerequisiteClosure {
    pub const DEFAULT_DEPTH: usize = 2;

    /// `requires` links curriculum entries to requisites, `requisites` holds
    /// the rules and `satisfies` lists each requisite's candidate courses.
    pub fn new(requires: Table, requisites: Table, satisfies: Table) -> Self {
        Self {
            requires,
            requisites,
            satisfies,
            depth: Self::DEFAULT_DEPTH,
            policy: UnresolvedPolicy::default(),
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// Columns of an offering row: the curriculum placement plus its program and course.
    pub fn offering_columns() -> Vec<String> {
        Dataset::Curricula
            .columns()
            .iter()
            .copied()
            .chain([STUDY_PROGRAM_ID, COURSE_ID])
            .map(str::to_string)
            .collect()
    }

    /// ONE, ANY and TOTAL rules, grouped per offered course within a program.
    pub fn satisfaction_filter() -> impl FilteringStrategy {
        let group = [STUDY_PROGRAM_ID, OFFERED_COURSE];
        let one = NotEqual::new(PREREQUISITE_TYPE, CoursePrerequisiteType::One)
            .or(NotNull::new(MATCHED_CANDIDATE));
        let any = NotEqual::new(PREREQUISITE_TYPE, CoursePrerequisiteType::Any)
            .or(GroupExists::new(group, MATCHED_CANDIDATE));
        let total = NotEqual::new(PREREQUISITE_TYPE, CoursePrerequisiteType::Total).or(
            GroupHasAtLeastNMembers::new(group, MATCHED_CANDIDATE, MINIMUM_REQUIRED),
        );
        one.and(any).and(total)
    }

    /// Stages of one pass, numbered from 1.
    pub fn pass_stages(&self, pass: usize) -> Vec<Stage> {
        let merge = Stage::new(format!("merge-requisites-{pass}"), StageKind::Merge)
            .add_step(Step::new(
                format!("merge-requires-{pass}"),
                Operation::Merge(MergeArgs::on(self.requires.clone(), [CURRICULUM_ID]).how(JoinHow::Left)),
            ))
            .add_step(Step::new(
                format!("merge-requisites-{pass}"),
                Operation::Merge(MergeArgs::on(self.requisites.clone(), [REQUISITE_ID]).how(JoinHow::Left)),
            ))
            .add_step(Step::new(
                format!("merge-satisfies-{pass}"),
                Operation::Merge(MergeArgs::on(self.satisfies.clone(), [REQUISITE_ID]).how(JoinHow::Left)),
            ));

        let adjacency = Stage::new(format!("match-offered-prerequisites-{pass}"), StageKind::Merge)
            .add_step(Step::new(
                format!("self-merge-offered-courses-{pass}"),
                Operation::SelfMerge(
                    SelfMergeArgs::new(
                        [STUDY_PROGRAM_ID, PREREQUISITE_COURSE_ID],
                        [STUDY_PROGRAM_ID, COURSE_ID],
                        [STUDY_PROGRAM_ID, COURSE_ID],
                    )
                    .how(JoinHow::Left),
                ),
            ));

        let filter = Stage::new(format!("filter-unsatisfied-{pass}"), StageKind::Filter).add_step(
            Step::new(
                format!("filter-prerequisite-rules-{pass}"),
                Operation::Filter(FilterArgs::new(Self::satisfaction_filter())),
            ),
        );

        let rename = Stage::new(format!("rename-columns-{pass}"), StageKind::Rename).add_step(
            Step::new(
                format!("rename-offered-course-{pass}"),
                Operation::Rename(RenameArgs::new([(OFFERED_COURSE, COURSE_ID)])),
            ),
        );

        let select = Stage::new(format!("select-offerings-{pass}"), StageKind::Select).add_step(
            Step::new(
                format!("select-offering-columns-{pass}"),
                Operation::Select(SelectArgs::new(Self::offering_columns()).drop_duplicates()),
            ),
        );

        vec![merge, adjacency, filter, rename, select]
    }

    /// Append `depth` passes and the convergence check to `pipeline`.
    ///
    /// The pipeline's table at that point must carry the offering columns.
    pub fn append_to(&self, pipeline: Pipeline) -> Pipeline {
        let pipeline = (1..=self.depth)
            .flat_map(|pass| self.pass_stages(pass))
            .fold(pipeline, Pipeline::add_stage);

        let check = Stage::new("check-prerequisite-closure", StageKind::Validate).add_step(Step::new(
            "check-prerequisite-convergence",
            Operation::ConvergenceCheck(ConvergenceCheckArgs {
                stages: self.pass_stages(self.depth + 1),
                depth: self.depth,
                policy: self.policy,
            }),
        ));
        pipeline.add_stage(check)
    }
}
