//! Relational joins over [`Table`].
//!
//! Matching rows is done by a polars hash join; this module resolves the
//! output columns and assembles the joined rows.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::frame::join_positions;
use crate::table::Table;
use crate::value::Value;

/// Join flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinHow {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
    Cross,
}

impl JoinHow {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinHow::Inner => "inner",
            JoinHow::Left => "left",
            JoinHow::Right => "right",
            JoinHow::Outer => "outer",
            JoinHow::Cross => "cross",
        }
    }
}

impl fmt::Display for JoinHow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which columns to match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKeys {
    /// Same column names on both sides.
    On(Vec<String>),
    /// Pairwise left/right column names.
    LeftRight { left: Vec<String>, right: Vec<String> },
    /// No keys; only valid for [`JoinHow::Cross`].
    None,
}

impl JoinKeys {
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JoinKeys::On(columns.into_iter().map(Into::into).collect())
    }

    pub fn left_right<L, R, S>(left: L, right: R) -> Self
    where
        L: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JoinKeys::LeftRight {
            left: left.into_iter().map(Into::into).collect(),
            right: right.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve into `(left, right)` column pairs.
    pub fn pairs(&self) -> Result<Vec<(String, String)>> {
        match self {
            JoinKeys::On(columns) => {
                if columns.is_empty() {
                    return Err(invalid("'on' must name at least one column"));
                }
                Ok(columns.iter().map(|c| (c.clone(), c.clone())).collect())
            }
            JoinKeys::LeftRight { left, right } => {
                if left.is_empty() || right.is_empty() {
                    return Err(invalid("'left_on' and 'right_on' must both be given"));
                }
                if left.len() != right.len() {
                    return Err(invalid(&format!(
                        "'left_on' has {} columns but 'right_on' has {}",
                        left.len(),
                        right.len()
                    )));
                }
                Ok(left.iter().cloned().zip(right.iter().cloned()).collect())
            }
            JoinKeys::None => Ok(Vec::new()),
        }
    }
}

impl fmt::Display for JoinKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKeys::On(columns) => write!(f, "on=[{}]", columns.join(", ")),
            JoinKeys::LeftRight { left, right } => write!(
                f,
                "left_on=[{}] right_on=[{}]",
                left.join(", "),
                right.join(", ")
            ),
            JoinKeys::None => f.write_str("cross"),
        }
    }
}

/// Suffixes appended to colliding non-key column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suffixes {
    pub left: String,
    pub right: String,
}

impl Suffixes {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl Default for Suffixes {
    fn default() -> Self {
        Self::new("_x", "_y")
    }
}

fn invalid(reason: &str) -> TableError {
    TableError::InvalidJoin {
        reason: reason.to_string(),
    }
}

/// Resolved output layout of a join.
struct JoinLayout {
    columns: Vec<String>,
    /// Left column index -> right column index for coalesced key columns.
    coalesced: HashMap<usize, usize>,
    /// Right column indices that appear in the output.
    right_kept: Vec<usize>,
}

impl JoinLayout {
    fn resolve(left: &Table, right: &Table, pairs: &[(String, String)], suffixes: &Suffixes) -> Result<Self> {
        let mut coalesced = HashMap::new();
        let mut dropped_right = HashSet::new();
        for (l, r) in pairs {
            if l == r {
                let li = left.column_index(l)?;
                let ri = right.column_index(r)?;
                coalesced.insert(li, ri);
                dropped_right.insert(ri);
            }
        }

        let right_kept: Vec<usize> = (0..right.width())
            .filter(|idx| !dropped_right.contains(idx))
            .collect();
        let right_names: HashSet<&str> = right_kept
            .iter()
            .map(|&idx| right.columns()[idx].as_str())
            .collect();
        let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();

        let mut columns = Vec::with_capacity(left.width() + right_kept.len());
        for (idx, name) in left.columns().iter().enumerate() {
            if !coalesced.contains_key(&idx) && right_names.contains(name.as_str()) {
                columns.push(format!("{name}{}", suffixes.left));
            } else {
                columns.push(name.clone());
            }
        }
        for &idx in &right_kept {
            let name = &right.columns()[idx];
            if left_names.contains(name.as_str()) {
                columns.push(format!("{name}{}", suffixes.right));
            } else {
                columns.push(name.clone());
            }
        }

        Ok(Self {
            columns,
            coalesced,
            right_kept,
        })
    }

    fn combine(&self, left_width: usize, l: Option<&[Value]>, r: Option<&[Value]>) -> Vec<Value> {
        let mut row = Vec::with_capacity(self.columns.len());
        for idx in 0..left_width {
            let value = match (l, self.coalesced.get(&idx), r) {
                (Some(l), _, _) => l[idx].clone(),
                (None, Some(&ri), Some(r)) => r[ri].clone(),
                _ => Value::Null,
            };
            row.push(value);
        }
        for &idx in &self.right_kept {
            row.push(r.map_or(Value::Null, |r| r[idx].clone()));
        }
        row
    }
}

impl Table {
    /// Join `self` (left) with `other` (right).
    ///
    /// Key pairs that share a name collapse into one output column; other
    /// colliding names receive `suffixes`. Null keys never match.
    pub fn join(&self, other: &Table, keys: &JoinKeys, how: JoinHow, suffixes: &Suffixes) -> Result<Table> {
        let pairs = keys.pairs()?;
        match (how, pairs.is_empty()) {
            (JoinHow::Cross, false) => return Err(invalid("a cross join takes no keys")),
            (JoinHow::Cross, true) => {}
            (_, true) => return Err(invalid("either 'on' or 'left_on' and 'right_on' must be given")),
            (_, false) => {}
        }

        let layout = JoinLayout::resolve(self, other, &pairs, suffixes)?;
        let left_keys: Vec<usize> = pairs
            .iter()
            .map(|(l, _)| self.column_index(l))
            .collect::<Result<_>>()?;
        let right_keys: Vec<usize> = pairs
            .iter()
            .map(|(_, r)| other.column_index(r))
            .collect::<Result<_>>()?;

        let width = self.width();
        let rows = join_positions(self, &left_keys, other, &right_keys, how)?
            .into_iter()
            .map(|(l, r)| {
                let l = l.and_then(|idx| self.rows().get(idx)).map(Vec::as_slice);
                let r = r.and_then(|idx| other.rows().get(idx)).map(Vec::as_slice);
                layout.combine(width, l, r)
            })
            .collect();

        Table::from_parts(layout.columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offers() -> Table {
        Table::from_rows(
            ["curriculum_id", "study_program_id"],
            vec![
                vec![Value::from("cu1"), Value::from("p1")],
                vec![Value::from("cu2"), Value::from("p1")],
                vec![Value::Null, Value::from("p2")],
            ],
        )
        .expect("offers")
    }

    fn includes() -> Table {
        Table::from_rows(
            ["curriculum_id", "course_id"],
            vec![
                vec![Value::from("cu2"), Value::from("c2")],
                vec![Value::from("cu1"), Value::from("c1")],
                vec![Value::from("cu3"), Value::from("c3")],
                vec![Value::Null, Value::from("c4")],
            ],
        )
        .expect("includes")
    }

    #[test]
    fn inner_join_coalesces_shared_key() {
        let joined = offers()
            .join(&includes(), &JoinKeys::on(["curriculum_id"]), JoinHow::Inner, &Suffixes::default())
            .expect("join");
        assert_eq!(joined.columns(), ["curriculum_id", "study_program_id", "course_id"]);
        assert_eq!(joined.height(), 2);
        assert_eq!(joined.value(0, "course_id"), Some(&Value::from("c1")));
        assert_eq!(joined.value(1, "course_id"), Some(&Value::from("c2")));
    }

    #[test]
    fn null_keys_never_match() {
        let joined = offers()
            .join(&includes(), &JoinKeys::on(["curriculum_id"]), JoinHow::Left, &Suffixes::default())
            .expect("join");
        assert_eq!(joined.height(), 3);
        assert_eq!(joined.value(2, "study_program_id"), Some(&Value::from("p2")));
        assert_eq!(joined.value(2, "course_id"), Some(&Value::Null));
    }

    #[test]
    fn right_join_takes_key_from_right() {
        let joined = offers()
            .join(&includes(), &JoinKeys::on(["curriculum_id"]), JoinHow::Right, &Suffixes::default())
            .expect("join");
        assert_eq!(joined.height(), 4);
        assert_eq!(joined.value(0, "curriculum_id"), Some(&Value::from("cu2")));
        assert_eq!(joined.value(2, "curriculum_id"), Some(&Value::from("cu3")));
        assert_eq!(joined.value(2, "study_program_id"), Some(&Value::Null));
    }

    #[test]
    fn outer_join_appends_unmatched_right_rows() {
        let joined = offers()
            .join(&includes(), &JoinKeys::on(["curriculum_id"]), JoinHow::Outer, &Suffixes::default())
            .expect("join");
        // 2 matched + 1 unmatched left + 2 unmatched right
        assert_eq!(joined.height(), 5);
        assert_eq!(joined.value(3, "course_id"), Some(&Value::from("c3")));
        assert_eq!(joined.value(4, "curriculum_id"), Some(&Value::Null));
    }

    #[test]
    fn differently_named_keys_are_suffixed_on_collision() {
        let satisfies = Table::from_rows(
            ["study_program_id", "prerequisite_course_id", "course_id"],
            vec![vec![Value::from("p1"), Value::from("c1"), Value::from("c9")]],
        )
        .expect("satisfies");
        let lookup = Table::from_rows(
            ["study_program_id", "course_id"],
            vec![vec![Value::from("p1"), Value::from("c1")]],
        )
        .expect("lookup");
        let joined = satisfies
            .join(
                &lookup,
                &JoinKeys::left_right(
                    ["study_program_id", "prerequisite_course_id"],
                    ["study_program_id", "course_id"],
                ),
                JoinHow::Left,
                &Suffixes::default(),
            )
            .expect("join");
        assert_eq!(
            joined.columns(),
            ["study_program_id", "prerequisite_course_id", "course_id_x", "course_id_y"]
        );
        assert_eq!(joined.value(0, "course_id_x"), Some(&Value::from("c9")));
        assert_eq!(joined.value(0, "course_id_y"), Some(&Value::from("c1")));
    }

    #[test]
    fn composite_keys_with_a_null_part_never_match() {
        let left = Table::from_rows(
            ["study_program_id", "course_id"],
            vec![
                vec![Value::from("p1"), Value::from("c1")],
                vec![Value::Null, Value::from("c1")],
            ],
        )
        .expect("left");
        let right = Table::from_rows(
            ["study_program_id", "course_id", "course_type"],
            vec![
                vec![Value::Null, Value::from("c1"), Value::from("ELECTIVE")],
                vec![Value::from("p1"), Value::from("c1"), Value::from("MANDATORY")],
            ],
        )
        .expect("right");
        let joined = left
            .join(
                &right,
                &JoinKeys::on(["study_program_id", "course_id"]),
                JoinHow::Left,
                &Suffixes::default(),
            )
            .expect("join");
        assert_eq!(joined.height(), 2);
        assert_eq!(joined.value(0, "course_type"), Some(&Value::from("MANDATORY")));
        assert_eq!(joined.value(1, "course_type"), Some(&Value::Null));
    }

    #[test]
    fn int_and_string_keys_do_not_match() {
        let left = Table::from_rows(["k"], vec![vec![Value::Int(1)]]).expect("left");
        let right = Table::from_rows(["k", "v"], vec![vec![Value::from("1"), Value::from("x")]])
            .expect("right");
        let joined = left
            .join(&right, &JoinKeys::on(["k"]), JoinHow::Inner, &Suffixes::default())
            .expect("join");
        assert!(joined.is_empty());
    }

    #[test]
    fn cross_join_is_cartesian() {
        let joined = offers()
            .join(&includes(), &JoinKeys::None, JoinHow::Cross, &Suffixes::default())
            .expect("join");
        assert_eq!(joined.height(), 12);
        assert!(joined.has_column("curriculum_id_x"));
        assert!(joined.has_column("curriculum_id_y"));
    }

    #[test]
    fn missing_keys_are_rejected() {
        let err = offers()
            .join(&includes(), &JoinKeys::None, JoinHow::Inner, &Suffixes::default())
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidJoin { .. }));

        let err = JoinKeys::left_right(["a", "b"], ["a"]).pairs().unwrap_err();
        assert!(err.to_string().contains("left_on"));
    }
}
