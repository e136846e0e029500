//! Integration tests for pipeline assembly and execution.

use std::sync::Arc;

use catalog_engine::{
    ChoiceValidator, EngineError, FilterArgs, LoadArgs, NotNull, Operation, Pipeline,
    PipelineState, RangeValidator, RenameArgs, SelectArgs, Stage, Step, StoreArgs, ValidateArgs,
};
use catalog_model::{Dataset, StageKind, Table, Value};
use catalog_storage::MemoryStorage;

fn teaches() -> Table {
    Table::from_rows(
        ["teaches_id", "course_id", "professor_id"],
        vec![
            vec![Value::from("t1"), Value::from("c1"), Value::from("p1")],
            vec![Value::from("t2"), Value::from("c2"), Value::Null],
            vec![Value::from("t1"), Value::from("c1"), Value::from("p1")],
            vec![Value::from("t3"), Value::from("c2"), Value::from("p2")],
        ],
    )
    .unwrap()
}

fn teaches_pipeline(storage: &Arc<MemoryStorage>) -> Pipeline {
    Pipeline::new("teaches-validator")
        .add_stage(
            Stage::new("load-data", StageKind::Load).add_step(Step::new(
                "load-teaches",
                Operation::Load(LoadArgs::new(storage.clone(), Dataset::Teaches).drop_duplicates()),
            )),
        )
        .add_stage(
            Stage::new("filter-data", StageKind::Filter).add_step(Step::new(
                "filter-null-professors",
                Operation::Filter(FilterArgs::new(NotNull::new("professor_id"))),
            )),
        )
        .add_stage(
            Stage::new("validate-data", StageKind::Validate).add_step(Step::new(
                "validate-course-id",
                Operation::Validate(ValidateArgs::new(ChoiceValidator::new(
                    "course_id",
                    ["c1", "c2"],
                ))),
            )),
        )
        .add_stage(
            Stage::new("store-data", StageKind::Store).add_step(Step::new(
                "store-teaches",
                Operation::Store(StoreArgs::new(storage.clone(), Dataset::Teaches)),
            )),
        )
}

#[test]
fn test_load_filter_validate_store() {
    let storage = Arc::new(MemoryStorage::new().with_table(Dataset::Teaches, teaches()));
    let mut pipeline = teaches_pipeline(&storage).build();

    let out = pipeline.run().unwrap();

    assert_eq!(out.height(), 2);
    assert_eq!(pipeline.state(), PipelineState::Done);
    let stored = storage.get(Dataset::Teaches).unwrap().unwrap();
    assert_eq!(stored, out);
}

#[test]
fn test_render_plan() {
    let storage = Arc::new(MemoryStorage::new());
    let plan = teaches_pipeline(&storage).build().render_plan();
    insta::assert_snapshot!(plan.trim_end(), @r#"
    pipeline teaches-validator
      [LOAD] load-data
        - load-teaches: load teaches from memory (dedupe)
      [FILTER] filter-data
        - filter-null-professors: filter not_null(professor_id)
      [VALIDATE] validate-data
        - validate-course-id: validate choice(course_id, {"c1", "c2"})
      [STORE] store-data
        - store-teaches: store teaches to memory
    "#);
}

#[test]
fn test_input_table_is_never_mutated() {
    let input = teaches();
    let before = input.clone();
    let mut pipeline = Pipeline::new("reshape")
        .with_data(&input)
        .add_stage(
            Stage::new("rename", StageKind::Rename).add_step(Step::new(
                "rename-professor",
                Operation::Rename(RenameArgs::new([("professor_id", "lecturer")])),
            )),
        )
        .add_stage(
            Stage::new("select", StageKind::Select).add_step(Step::new(
                "select-lecturer",
                Operation::Select(SelectArgs::new(["lecturer"]).drop_duplicates()),
            )),
        )
        .build();

    let out = pipeline.run().unwrap();

    assert_eq!(out.columns(), ["lecturer"]);
    assert_eq!(input, before);
}

#[test]
fn test_rerun_is_deterministic() {
    let input = teaches();
    let mut pipeline = Pipeline::new("dedupe")
        .with_data(&input)
        .add_stage(
            Stage::new("filter", StageKind::Filter).add_step(Step::new(
                "filter-null-professors",
                Operation::Filter(FilterArgs::new(NotNull::new("professor_id"))),
            )),
        )
        .add_stage(
            Stage::new("select", StageKind::Select).add_step(Step::new(
                "select-all",
                Operation::Select(
                    SelectArgs::new(["teaches_id", "course_id", "professor_id"]).drop_duplicates(),
                ),
            )),
        )
        .build();

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.height(), 2);
}

#[test]
fn test_validation_failure_aborts_before_store() {
    let courses = Table::from_rows(
        [
            "course_id",
            "course_code",
            "course_name_mk",
            "course_name_en",
            "course_url",
            "course_level",
        ],
        vec![vec![
            Value::from("c1"),
            Value::from("F23L1S001"),
            Value::Null,
            Value::Null,
            Value::from("http://x.edu/c1"),
            Value::from(9),
        ]],
    )
    .unwrap();
    let storage = Arc::new(MemoryStorage::new().with_table(Dataset::Courses, courses));
    let sink = Arc::new(MemoryStorage::new());
    let mut pipeline = Pipeline::new("courses")
        .add_stage(
            Stage::new("load", StageKind::Load).add_step(Step::new(
                "load-courses",
                Operation::Load(LoadArgs::new(storage.clone(), Dataset::Courses)),
            )),
        )
        .add_stage(
            Stage::new("validate", StageKind::Validate).add_step(Step::new(
                "validate-course-level",
                Operation::Validate(ValidateArgs::new(RangeValidator::new("course_level", 1, 3))),
            )),
        )
        .add_stage(
            Stage::new("store", StageKind::Store).add_step(Step::new(
                "store-courses",
                Operation::Store(StoreArgs::new(sink.clone(), Dataset::Courses)),
            )),
        )
        .build();

    let err = match pipeline.run() {
        Err(EngineError::Validation(err)) => err,
        other => panic!("expected a validation error, got {other:?}"),
    };
    assert_eq!(err.column, "course_level");
    assert_eq!(err.invalid.height(), 1);
    assert!(sink.datasets().unwrap().is_empty());
    assert_eq!(pipeline.state(), PipelineState::Built);
}
