//! Properties of the validator and filter strategies.

use std::collections::BTreeMap;

use catalog_engine::{
    ChoiceValidator, EngineError, FilteringStrategy, GroupHasAtLeastNMembers, ValidatorStrategy,
};
use catalog_model::{Table, Value};
use proptest::prelude::*;

const ALLOWED: [&str; 3] = ["ANY", "ONE", "TOTAL"];

fn kinds_table(kinds: Vec<String>) -> Table {
    Table::from_rows(
        ["course_prerequisite_type"],
        kinds.into_iter().map(|kind| vec![Value::from(kind)]).collect(),
    )
    .expect("valid rows")
}

proptest! {
    #[test]
    fn choice_passes_exactly_when_every_value_is_allowed(
        kinds in prop::collection::vec("ANY|ONE|TOTAL|NONE", 0..12),
    ) {
        let table = kinds_table(kinds.clone());
        let outside = kinds.iter().filter(|kind| !ALLOWED.contains(&kind.as_str())).count();

        let result = ChoiceValidator::new("course_prerequisite_type", ALLOWED).validate(table.clone());

        match result {
            Ok(passed) => {
                prop_assert_eq!(outside, 0);
                prop_assert_eq!(passed, table);
            }
            Err(EngineError::Validation(err)) => {
                prop_assert_eq!(err.invalid.height(), outside);
                prop_assert_eq!(err.column, "course_prerequisite_type");
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn group_threshold_keeps_or_drops_whole_groups(
        rows in prop::collection::vec((0i64..3, prop::option::of(0i64..5)), 0..16),
    ) {
        let table = Table::from_rows(
            ["group", "child", "minimum"],
            rows.iter()
                .map(|(group, child)| {
                    vec![
                        Value::Int(*group),
                        child.map_or(Value::Null, Value::Int),
                        Value::Int(2),
                    ]
                })
                .collect(),
        )
        .expect("valid rows");
        let mut matched: BTreeMap<i64, usize> = BTreeMap::new();
        for (group, child) in &rows {
            *matched.entry(*group).or_default() += usize::from(child.is_some());
        }
        let expected: Vec<i64> = rows
            .iter()
            .map(|(group, _)| *group)
            .filter(|group| matched[group] >= 2)
            .collect();

        let filtered = GroupHasAtLeastNMembers::new(["group"], "child", "minimum")
            .filter(&table)
            .expect("filter");

        let kept: Vec<i64> = filtered
            .column_values("group")
            .expect("group")
            .into_iter()
            .filter_map(|value| match value {
                Value::Int(group) => Some(*group),
                _ => None,
            })
            .collect();
        prop_assert_eq!(kept, expected);
    }
}
