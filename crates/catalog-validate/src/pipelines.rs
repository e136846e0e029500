//! One pipeline factory per catalog dataset.
//!
//! Factories only assemble stages; nothing is read until the built pipeline
//! runs. Tables passed in are validated outputs of earlier pipelines (or raw
//! reference data where noted) and are copied into the steps that use them.

use catalog_engine::{
    ChoiceValidator, FilterArgs, LoadArgs, MergeArgs, NotEqual, NotNull, Operation, Pipeline,
    PrerequisiteClosure, RangeValidator, RegexValidator, Result, SelectArgs, Stage, Step,
    StoreArgs, UrlValidator, ValidateArgs, ValidatorStrategy,
};
use catalog_model::{CoursePrerequisiteType, Dataset, JoinHow, StageKind, Table};

use crate::context::CatalogContext;

const CURRICULUM_ID: &str = "curriculum_id";
const REQUISITE_ID: &str = "requisite_id";
const PREREQUISITE_TYPE: &str = "course_prerequisite_type";
/// Never null in a validated curriculum, so a null after a left merge marks a removed one.
const CURRICULUM_MARKER: &str = "course_semester";

/// Tables the curricula pipeline joins against.
#[derive(Debug, Clone, Copy)]
pub struct CurriculaReferences<'a> {
    /// Validated requisites.
    pub requisites: &'a Table,
    /// Raw `requires` rows.
    pub requires: &'a Table,
    /// Raw `satisfies` rows.
    pub satisfies: &'a Table,
    /// Raw offers.
    pub offers: &'a Table,
    /// Raw includes.
    pub includes: &'a Table,
}

fn slug(text: &str) -> String {
    text.replace('_', "-")
}

fn pipeline_name(dataset: Dataset) -> String {
    format!("{}-validator", slug(dataset.as_str()))
}

fn validate_step(strategy: impl ValidatorStrategy + 'static) -> Step {
    Step::new(
        format!("validate-{}", slug(strategy.column())),
        Operation::Validate(ValidateArgs::new(strategy)),
    )
}

/// Every value of `column` must appear in `reference_column` of `reference`.
fn foreign_key_step(column: &str, reference: &Table, reference_column: &str) -> Result<Step> {
    Ok(validate_step(ChoiceValidator::from_column(
        column,
        reference,
        reference_column,
    )?))
}

fn select_columns_stage(dataset: Dataset) -> Stage {
    Stage::new("select-columns", StageKind::Select).add_step(Step::new(
        format!("select-{}-columns", slug(dataset.as_str())),
        Operation::Select(SelectArgs::new(dataset.columns().iter().copied()).drop_duplicates()),
    ))
}

/// Drop rows whose curriculum did not survive curricula validation.
fn removed_curricula_stages(curricula: &Table) -> [Stage; 2] {
    let merge = Stage::new("merge-data", StageKind::Merge).add_step(Step::new(
        "merge-with-curricula-data",
        Operation::Merge(MergeArgs::on(curricula.clone(), [CURRICULUM_ID]).how(JoinHow::Left)),
    ));
    let filter = Stage::new("filter-removed-curricula", StageKind::Filter).add_step(Step::new(
        "filter-out-removed-curricula",
        Operation::Filter(FilterArgs::new(NotNull::new(CURRICULUM_MARKER))),
    ));
    [merge, filter]
}

/// Drop rows that point at a `NONE` requisite.
///
/// Unknown requisite ids survive and are reported by the foreign-key check.
fn none_requisite_stages(raw_requisites: &Table) -> Result<[Stage; 2]> {
    let kinds = raw_requisites.select(&[REQUISITE_ID, PREREQUISITE_TYPE], true)?;
    let merge = Stage::new("merge-requisite-types", StageKind::Merge).add_step(Step::new(
        "merge-with-requisite-types",
        Operation::Merge(MergeArgs::on(kinds, [REQUISITE_ID]).how(JoinHow::Left)),
    ));
    let filter = Stage::new("filter-none-requisites", StageKind::Filter).add_step(Step::new(
        "filter-out-none-requisites",
        Operation::Filter(FilterArgs::new(NotEqual::new(
            PREREQUISITE_TYPE,
            CoursePrerequisiteType::None,
        ))),
    ));
    Ok([merge, filter])
}

impl CatalogContext {
    fn load_stage(&self, dataset: Dataset) -> Stage {
        Stage::new("load-data", StageKind::Load).add_step(Step::new(
            format!("load-{}-data", slug(dataset.as_str())),
            Operation::Load(LoadArgs::new(self.source.clone(), dataset).drop_duplicates()),
        ))
    }

    fn store_stage(&self, dataset: Dataset) -> Stage {
        Stage::new("store-data", StageKind::Store).add_step(Step::new(
            format!("store-{}-data", slug(dataset.as_str())),
            Operation::Store(StoreArgs::new(self.sink.clone(), dataset).drop_duplicates()),
        ))
    }

    fn identifier_step(&self, dataset: Dataset) -> Result<Step> {
        let column = dataset.id_column();
        Ok(Step::new(
            format!("validate-{}", slug(column)),
            Operation::Validate(self.rules.identifier_format.validator(column)?),
        ))
    }

    pub fn courses_pipeline(&self) -> Result<Pipeline> {
        let rules = &self.rules;
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Courses)?)
            .add_step(validate_step(RegexValidator::from_pattern(
                "course_code",
                &rules.course_code_pattern,
            )?))
            .add_step(validate_step(UrlValidator::new("course_url")))
            .add_step(validate_step(ChoiceValidator::new(
                "course_level",
                rules.course_levels.iter().copied(),
            )));

        Ok(Pipeline::new(pipeline_name(Dataset::Courses))
            .add_stage(self.load_stage(Dataset::Courses))
            .add_stage(validate)
            .add_stage(self.store_stage(Dataset::Courses)))
    }

    pub fn professors_pipeline(&self) -> Result<Pipeline> {
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Professors)?);

        Ok(Pipeline::new(pipeline_name(Dataset::Professors))
            .add_stage(self.load_stage(Dataset::Professors))
            .add_stage(validate)
            .add_stage(self.store_stage(Dataset::Professors)))
    }

    pub fn study_programs_pipeline(&self) -> Result<Pipeline> {
        let rules = &self.rules;
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::StudyPrograms)?)
            .add_step(validate_step(RegexValidator::from_pattern(
                "study_program_code",
                &rules.study_program_code_pattern,
            )?))
            .add_step(validate_step(UrlValidator::new("study_program_url")))
            .add_step(validate_step(ChoiceValidator::new(
                "study_program_duration",
                rules.study_program_durations.iter().copied(),
            )));

        Ok(Pipeline::new(pipeline_name(Dataset::StudyPrograms))
            .add_stage(self.load_stage(Dataset::StudyPrograms))
            .add_stage(validate)
            .add_stage(self.store_stage(Dataset::StudyPrograms)))
    }

    /// Assignments without a professor are dropped; the rest must reference
    /// validated courses and professors.
    pub fn teaches_pipeline(&self, courses: &Table, professors: &Table) -> Result<Pipeline> {
        let filter = Stage::new("filter-data", StageKind::Filter).add_step(Step::new(
            "filter-out-null-professor-ids",
            Operation::Filter(FilterArgs::new(NotNull::new("professor_id"))),
        ));
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(foreign_key_step("professor_id", professors, "professor_id")?)
            .add_step(foreign_key_step("course_id", courses, "course_id")?);

        Ok(Pipeline::new(pipeline_name(Dataset::Teaches))
            .add_stage(self.load_stage(Dataset::Teaches))
            .add_stage(filter)
            .add_stage(validate)
            .add_stage(self.store_stage(Dataset::Teaches)))
    }

    pub fn requisites_pipeline(&self) -> Result<Pipeline> {
        let rules = &self.rules;
        let filter = Stage::new("filter-data", StageKind::Filter).add_step(Step::new(
            "filter-out-none-course-prerequisite-types",
            Operation::Filter(FilterArgs::new(NotEqual::new(
                PREREQUISITE_TYPE,
                CoursePrerequisiteType::None,
            ))),
        ));
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Requisites)?)
            .add_step(validate_step(ChoiceValidator::new(
                PREREQUISITE_TYPE,
                rules.prerequisite_types.iter().copied(),
            )))
            .add_step(validate_step(RangeValidator::from_range(
                "minimum_required_number_of_courses",
                rules.minimum_required_courses.clone(),
            )));

        Ok(Pipeline::new(pipeline_name(Dataset::Requisites))
            .add_stage(self.load_stage(Dataset::Requisites))
            .add_stage(filter)
            .add_stage(validate)
            .add_stage(self.store_stage(Dataset::Requisites)))
    }

    /// Curriculum entries are expanded into offerings through offers and
    /// includes, pruned by the prerequisite closure, then validated.
    ///
    /// Entries missing from offers or includes are dropped by the inner joins.
    pub fn curricula_pipeline(&self, refs: CurriculaReferences<'_>) -> Result<Pipeline> {
        let rules = &self.rules;
        let merge = Stage::new("merge-data", StageKind::Merge)
            .add_step(Step::new(
                "merge-with-offers-data",
                Operation::Merge(MergeArgs::on(refs.offers.clone(), [CURRICULUM_ID])),
            ))
            .add_step(Step::new(
                "merge-with-includes-data",
                Operation::Merge(MergeArgs::on(refs.includes.clone(), [CURRICULUM_ID])),
            ));
        let offerings = Stage::new("select-offerings", StageKind::Select).add_step(Step::new(
            "select-offering-columns",
            Operation::Select(
                SelectArgs::new(PrerequisiteClosure::offering_columns()).drop_duplicates(),
            ),
        ));
        let closure = PrerequisiteClosure::new(
            refs.requires.clone(),
            refs.requisites.clone(),
            refs.satisfies.clone(),
        )
        .with_depth(rules.closure_depth)
        .with_policy(rules.unresolved_policy);
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Curricula)?)
            .add_step(validate_step(ChoiceValidator::new(
                "course_type",
                rules.course_types.iter().copied(),
            )))
            .add_step(validate_step(ChoiceValidator::new(
                "course_semester_season",
                rules.semester_seasons.iter().copied(),
            )))
            .add_step(validate_step(RangeValidator::from_range(
                "course_academic_year",
                rules.academic_years.clone(),
            )))
            .add_step(validate_step(RangeValidator::from_range(
                CURRICULUM_MARKER,
                rules.semesters.clone(),
            )));

        let pipeline = Pipeline::new(pipeline_name(Dataset::Curricula))
            .add_stage(self.load_stage(Dataset::Curricula))
            .add_stage(merge)
            .add_stage(offerings);
        Ok(closure
            .append_to(pipeline)
            .add_stage(validate)
            .add_stage(select_columns_stage(Dataset::Curricula))
            .add_stage(self.store_stage(Dataset::Curricula)))
    }

    pub fn includes_pipeline(&self, curricula: &Table, courses: &Table) -> Result<Pipeline> {
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(foreign_key_step("course_id", courses, "course_id")?)
            .add_step(foreign_key_step(CURRICULUM_ID, curricula, CURRICULUM_ID)?);

        let [merge, filter] = removed_curricula_stages(curricula);
        Ok(Pipeline::new(pipeline_name(Dataset::Includes))
            .add_stage(self.load_stage(Dataset::Includes))
            .add_stage(merge)
            .add_stage(filter)
            .add_stage(validate)
            .add_stage(select_columns_stage(Dataset::Includes))
            .add_stage(self.store_stage(Dataset::Includes)))
    }

    pub fn offers_pipeline(&self, curricula: &Table, study_programs: &Table) -> Result<Pipeline> {
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(foreign_key_step(
                "study_program_id",
                study_programs,
                "study_program_id",
            )?)
            .add_step(foreign_key_step(CURRICULUM_ID, curricula, CURRICULUM_ID)?);

        let [merge, filter] = removed_curricula_stages(curricula);
        Ok(Pipeline::new(pipeline_name(Dataset::Offers))
            .add_stage(self.load_stage(Dataset::Offers))
            .add_stage(merge)
            .add_stage(filter)
            .add_stage(validate)
            .add_stage(select_columns_stage(Dataset::Offers))
            .add_stage(self.store_stage(Dataset::Offers)))
    }

    /// The `satisfies` relation: candidate courses of each requisite.
    ///
    /// `raw_requisites` identifies rows tied to `NONE` requisites, which the
    /// requisites pipeline removed.
    pub fn prerequisites_pipeline(
        &self,
        raw_requisites: &Table,
        requisites: &Table,
        courses: &Table,
    ) -> Result<Pipeline> {
        let filter = Stage::new("filter-data", StageKind::Filter).add_step(Step::new(
            "filter-out-null-prerequisite-courses",
            Operation::Filter(FilterArgs::new(NotNull::new("prerequisite_course_id"))),
        ));
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Prerequisites)?)
            .add_step(foreign_key_step("prerequisite_course_id", courses, "course_id")?)
            .add_step(foreign_key_step(REQUISITE_ID, requisites, REQUISITE_ID)?);

        let [merge_kinds, filter_none] = none_requisite_stages(raw_requisites)?;
        Ok(Pipeline::new(pipeline_name(Dataset::Prerequisites))
            .add_stage(self.load_stage(Dataset::Prerequisites))
            .add_stage(filter)
            .add_stage(merge_kinds)
            .add_stage(filter_none)
            .add_stage(validate)
            .add_stage(select_columns_stage(Dataset::Prerequisites))
            .add_stage(self.store_stage(Dataset::Prerequisites)))
    }

    /// The `requires` relation: requisites attached to curriculum entries.
    pub fn postrequisites_pipeline(
        &self,
        curricula: &Table,
        raw_requisites: &Table,
        requisites: &Table,
    ) -> Result<Pipeline> {
        let filter = Stage::new("filter-data", StageKind::Filter).add_step(Step::new(
            "filter-out-null-requisites",
            Operation::Filter(FilterArgs::new(NotNull::new(REQUISITE_ID))),
        ));
        let validate = Stage::new("validate-data", StageKind::Validate)
            .add_step(self.identifier_step(Dataset::Postrequisites)?)
            .add_step(foreign_key_step(CURRICULUM_ID, curricula, CURRICULUM_ID)?)
            .add_step(foreign_key_step(REQUISITE_ID, requisites, REQUISITE_ID)?);

        let [merge_curricula, filter_curricula] = removed_curricula_stages(curricula);
        let [merge_kinds, filter_none] = none_requisite_stages(raw_requisites)?;
        Ok(Pipeline::new(pipeline_name(Dataset::Postrequisites))
            .add_stage(self.load_stage(Dataset::Postrequisites))
            .add_stage(filter)
            .add_stage(merge_curricula)
            .add_stage(filter_curricula)
            .add_stage(merge_kinds)
            .add_stage(filter_none)
            .add_stage(validate)
            .add_stage(select_columns_stage(Dataset::Postrequisites))
            .add_stage(self.store_stage(Dataset::Postrequisites)))
    }
}
