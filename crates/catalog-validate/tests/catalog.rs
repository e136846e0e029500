//! End-to-end catalog runs against in-memory storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use catalog_engine::{EngineError, UnresolvedPolicy};
use catalog_model::{Dataset, Table, Value};
use catalog_storage::{DatasetSource, MemoryStorage};
use catalog_validate::{CatalogContext, CatalogError, CatalogRules, run_catalog};

fn s(text: &str) -> Value {
    Value::from(text)
}

fn i(number: i64) -> Value {
    Value::from(number)
}

fn table(dataset: Dataset, rows: Vec<Vec<Value>>) -> Table {
    Table::from_rows(dataset.columns().iter().copied(), rows).unwrap()
}

fn course(id: &str, code: &str, level: i64) -> Vec<Value> {
    vec![
        s(id),
        s(code),
        Value::Null,
        Value::Null,
        s(&format!("https://finki.ukim.mk/course/{id}")),
        i(level),
    ]
}

fn curriculum(id: &str, year: i64, semester: i64) -> Vec<Value> {
    vec![s(id), s("MANDATORY"), s("WINTER"), i(year), i(semester)]
}

/// Four curriculum entries of one program. `c4` needs two of `{c1, c5}` but
/// `c5` is never offered, so its entry is pruned by the closure.
fn catalog() -> MemoryStorage {
    MemoryStorage::new()
        .with_table(
            Dataset::Courses,
            table(
                Dataset::Courses,
                vec![
                    course("c1", "F23L1W001", 1),
                    course("c1", "F23L1W001", 1),
                    course("c2", "F23L1S002", 1),
                    course("c3", "F23L2W003", 2),
                    course("c4", "F23L3S004", 3),
                    course("c5", "F23L3W005", 3),
                ],
            ),
        )
        .with_table(
            Dataset::Professors,
            table(
                Dataset::Professors,
                vec![
                    vec![s("p1"), s("Ana"), s("Petrova")],
                    vec![s("p2"), s("Marko"), s("Jovanov")],
                ],
            ),
        )
        .with_table(
            Dataset::StudyPrograms,
            table(
                Dataset::StudyPrograms,
                vec![vec![
                    s("sp1"),
                    s("SIIS2"),
                    s("Software Engineering"),
                    i(4),
                    s("https://finki.ukim.mk/program/siis"),
                ]],
            ),
        )
        .with_table(
            Dataset::Teaches,
            table(
                Dataset::Teaches,
                vec![
                    vec![s("t1"), s("c1"), s("p1")],
                    vec![s("t2"), s("c2"), Value::Null],
                    vec![s("t3"), s("c3"), s("p2")],
                ],
            ),
        )
        .with_table(
            Dataset::Requisites,
            table(
                Dataset::Requisites,
                vec![
                    vec![s("q-none"), s("NONE"), Value::Null],
                    vec![s("q-one"), s("ONE"), i(1)],
                    vec![s("q-total"), s("TOTAL"), i(2)],
                ],
            ),
        )
        .with_table(
            Dataset::Curricula,
            table(
                Dataset::Curricula,
                vec![
                    curriculum("cu1", 1, 1),
                    curriculum("cu2", 1, 1),
                    curriculum("cu3", 2, 3),
                    curriculum("cu4", 3, 5),
                    curriculum("cu5", 1, 1),
                ],
            ),
        )
        .with_table(
            Dataset::Offers,
            table(
                Dataset::Offers,
                ["o1", "o2", "o3", "o4"]
                    .iter()
                    .zip(["cu1", "cu2", "cu3", "cu4"])
                    .map(|(id, curriculum)| vec![s(id), s(curriculum), s("sp1")])
                    .collect(),
            ),
        )
        .with_table(
            Dataset::Includes,
            table(
                Dataset::Includes,
                vec![
                    vec![s("i1"), s("cu1"), s("c1")],
                    vec![s("i2"), s("cu2"), s("c2")],
                    vec![s("i3"), s("cu3"), s("c3")],
                    vec![s("i4"), s("cu4"), s("c4")],
                    vec![s("i5"), s("cu5"), s("c1")],
                ],
            ),
        )
        .with_table(
            Dataset::Postrequisites,
            table(
                Dataset::Postrequisites,
                vec![
                    vec![s("r1"), s("cu3"), s("q-one")],
                    vec![s("r2"), s("cu4"), s("q-total")],
                    vec![s("r3"), s("cu2"), s("q-none")],
                ],
            ),
        )
        .with_table(
            Dataset::Prerequisites,
            table(
                Dataset::Prerequisites,
                vec![
                    vec![s("s1"), s("c1"), s("q-one")],
                    vec![s("s2"), s("c2"), s("q-one")],
                    vec![s("s3"), s("c1"), s("q-total")],
                    vec![s("s4"), s("c5"), s("q-total")],
                    vec![s("s5"), s("c2"), s("q-none")],
                    vec![s("s6"), Value::Null, s("q-one")],
                ],
            ),
        )
}

fn run_with(rules: CatalogRules) -> (Arc<MemoryStorage>, Result<catalog_validate::CatalogSummary, CatalogError>) {
    let source = Arc::new(catalog());
    let sink = Arc::new(MemoryStorage::new());
    let ctx = CatalogContext::new(source, sink.clone(), rules);
    let result = run_catalog(&ctx);
    (sink, result)
}

fn ids(table: &Table, column: &str) -> Vec<String> {
    table
        .column_values(column)
        .unwrap()
        .into_iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_full_catalog_run() {
    let (sink, result) = run_with(CatalogRules::default());
    let summary = result.unwrap();

    let counts: Vec<(Dataset, usize, usize)> = summary
        .datasets
        .iter()
        .map(|d| (d.dataset, d.input_rows, d.stored_rows))
        .collect();
    assert_eq!(
        counts,
        [
            (Dataset::Courses, 6, 5),
            (Dataset::Professors, 2, 2),
            (Dataset::StudyPrograms, 1, 1),
            (Dataset::Teaches, 3, 2),
            (Dataset::Requisites, 3, 2),
            (Dataset::Curricula, 5, 3),
            (Dataset::Includes, 5, 3),
            (Dataset::Offers, 4, 3),
            (Dataset::Prerequisites, 6, 4),
            (Dataset::Postrequisites, 3, 1),
        ]
    );
    assert_eq!(sink.datasets().unwrap().len(), Dataset::ALL.len());

    let curricula = sink.get(Dataset::Curricula).unwrap().unwrap();
    assert_eq!(curricula.columns(), Dataset::Curricula.columns());
    assert_eq!(ids(&curricula, "curriculum_id"), ["cu1", "cu2", "cu3"]);

    let includes = sink.get(Dataset::Includes).unwrap().unwrap();
    assert_eq!(includes.columns(), Dataset::Includes.columns());
    assert_eq!(ids(&includes, "includes_id"), ["i1", "i2", "i3"]);

    let requires = sink.get(Dataset::Postrequisites).unwrap().unwrap();
    assert_eq!(ids(&requires, "requires_id"), ["r1"]);

    let satisfies = sink.get(Dataset::Prerequisites).unwrap().unwrap();
    assert_eq!(ids(&satisfies, "satisfies_id"), ["s1", "s2", "s3", "s4"]);
}

#[test]
fn test_summary_serializes_to_json() {
    let (_, result) = run_with(CatalogRules::default());
    let summary = result.unwrap();

    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["closure_depth"], 2);
    assert_eq!(json["datasets"][0]["dataset"], "courses");
    assert_eq!(json["datasets"][5]["stored_rows"], 3);
    assert_eq!(summary.get(Dataset::Curricula).map(|d| d.removed_rows()), Some(2));
}

#[test]
fn test_invalid_course_level_stops_the_run() {
    let rules = CatalogRules {
        course_levels: [2, 3].into(),
        ..CatalogRules::default()
    };
    let (sink, result) = run_with(rules);

    let err = result.unwrap_err();
    assert_eq!(err.dataset(), Some(Dataset::Courses));
    let CatalogError::Pipeline {
        source: EngineError::Validation(validation),
        ..
    } = err
    else {
        panic!("expected a validation failure");
    };
    assert_eq!(validation.column, "course_level");
    assert_eq!(ids(&validation.invalid, "course_id"), ["c1", "c2"]);
    assert!(sink.datasets().unwrap().is_empty());
}

#[test]
fn test_uuid_identifiers_reject_tokens() {
    let rules = CatalogRules {
        identifier_format: "uuid".parse().unwrap(),
        ..CatalogRules::default()
    };
    let (_, result) = run_with(rules);

    match result {
        Err(CatalogError::Pipeline {
            dataset: Dataset::Courses,
            source: EngineError::Validation(validation),
        }) => assert_eq!(validation.column, "course_id"),
        other => panic!("expected course_id validation failure, got {other:?}"),
    }
}

#[test]
fn test_shallow_closure_can_fail_the_run() {
    // with no passes the check itself finds cu4 unresolved
    let rules = CatalogRules {
        closure_depth: 0,
        unresolved_policy: UnresolvedPolicy::Fail,
        ..CatalogRules::default()
    };
    let (sink, result) = run_with(rules);

    match result {
        Err(CatalogError::Pipeline {
            dataset: Dataset::Curricula,
            source: EngineError::UnresolvedPrerequisites { depth: 0, dropped: 1 },
        }) => {}
        other => panic!("expected unresolved prerequisites, got {other:?}"),
    }
    // datasets before curricula were already stored
    assert!(sink.get(Dataset::Requisites).unwrap().is_some());
    assert!(sink.get(Dataset::Curricula).unwrap().is_none());
}

#[test]
fn test_missing_dataset_is_reported() {
    let source = Arc::new(MemoryStorage::new());
    let ctx = CatalogContext::new(source.clone(), source, CatalogRules::default());

    let err = run_catalog(&ctx).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Reference {
            dataset: Dataset::Courses,
            ..
        }
    ));
}

#[test]
fn test_final_year_and_largest_requisite_are_stored() {
    let source = catalog()
        .with_table(
            Dataset::Requisites,
            table(
                Dataset::Requisites,
                vec![
                    vec![s("q-none"), s("NONE"), Value::Null],
                    vec![s("q-one"), s("ONE"), i(1)],
                    vec![s("q-total"), s("TOTAL"), i(2)],
                    vec![s("q-all"), s("TOTAL"), i(39)],
                ],
            ),
        )
        .with_table(
            Dataset::Curricula,
            table(
                Dataset::Curricula,
                vec![
                    curriculum("cu1", 1, 1),
                    curriculum("cu2", 1, 1),
                    curriculum("cu3", 2, 3),
                    curriculum("cu4", 3, 5),
                    curriculum("cu5", 1, 1),
                    curriculum("cu6", 4, 8),
                ],
            ),
        )
        .with_table(
            Dataset::Offers,
            table(
                Dataset::Offers,
                ["o1", "o2", "o3", "o4", "o6"]
                    .iter()
                    .zip(["cu1", "cu2", "cu3", "cu4", "cu6"])
                    .map(|(id, curriculum)| vec![s(id), s(curriculum), s("sp1")])
                    .collect(),
            ),
        )
        .with_table(
            Dataset::Includes,
            table(
                Dataset::Includes,
                vec![
                    vec![s("i1"), s("cu1"), s("c1")],
                    vec![s("i2"), s("cu2"), s("c2")],
                    vec![s("i3"), s("cu3"), s("c3")],
                    vec![s("i4"), s("cu4"), s("c4")],
                    vec![s("i5"), s("cu5"), s("c1")],
                    vec![s("i6"), s("cu6"), s("c3")],
                ],
            ),
        );
    let sink = Arc::new(MemoryStorage::new());
    let ctx = CatalogContext::new(Arc::new(source), sink.clone(), CatalogRules::default());

    run_catalog(&ctx).unwrap();

    let requisites = sink.get(Dataset::Requisites).unwrap().unwrap();
    assert_eq!(ids(&requisites, "requisite_id"), ["q-one", "q-total", "q-all"]);
    let curricula = sink.get(Dataset::Curricula).unwrap().unwrap();
    assert_eq!(ids(&curricula, "curriculum_id"), ["cu1", "cu2", "cu3", "cu6"]);
    let includes = sink.get(Dataset::Includes).unwrap().unwrap();
    assert_eq!(ids(&includes, "includes_id"), ["i1", "i2", "i3", "i6"]);
}

/// Counts reads per dataset.
struct CountingSource {
    inner: MemoryStorage,
    reads: Mutex<BTreeMap<Dataset, usize>>,
}

impl DatasetSource for CountingSource {
    fn read(&self, dataset: Dataset) -> catalog_storage::Result<Table> {
        *self.reads.lock().unwrap().entry(dataset).or_default() += 1;
        self.inner.read(dataset)
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

#[test]
fn test_each_dataset_is_read_once() {
    let source = Arc::new(CountingSource {
        inner: catalog(),
        reads: Mutex::new(BTreeMap::new()),
    });
    let ctx = CatalogContext::new(source.clone(), Arc::new(MemoryStorage::new()), CatalogRules::default());

    let summary = run_catalog(&ctx).unwrap();

    let reads = source.reads.lock().unwrap().clone();
    assert_eq!(reads.len(), Dataset::ALL.len());
    assert!(reads.values().all(|&count| count == 1), "{reads:?}");
    assert_eq!(summary.get(Dataset::Courses).map(|d| d.input_rows), Some(6));
}
