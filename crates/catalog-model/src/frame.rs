//! Polars kernels behind the [`Table`] algebra.
//!
//! A table stays row-major. Joins, grouping and deduplication hand polars a
//! narrow frame holding one encoded key per row plus the row position, and
//! read row positions back out of the result.

use std::fmt::Write as _;

use polars::prelude::{
    Column, CrossJoin, DataFrame, DataFrameJoinOps, IdxSize, JoinArgs, JoinType, PolarsError,
    UniqueKeepStrategy,
};

use crate::error::{Result, TableError};
use crate::join::JoinHow;
use crate::table::Table;
use crate::value::Value;

const KEY: &str = "__key";
const ROW: &str = "__row";
const LEFT_KEY: &str = "__left_key";
const LEFT_ROW: &str = "__left_row";
const RIGHT_KEY: &str = "__right_key";
const RIGHT_ROW: &str = "__right_row";
/// Name polars gives the member list of `GroupBy::groups`.
const GROUPS: &str = "groups";

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::Frame {
            message: err.to_string(),
        }
    }
}

/// Row positions on each side of one joined row; `None` where the side did not match.
pub(crate) type JoinPair = (Option<usize>, Option<usize>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullKeys {
    /// A null anywhere in the key nulls the whole key, so it never matches.
    Unmatched,
    /// Null is an ordinary key value.
    Grouped,
}

/// Encodes the key cells of `row` into one string.
///
/// Every cell carries a type tag and strings a length prefix, so `Int(1)` and
/// `Str("1")` stay distinct and no two keys collide.
fn encode_key(row: &[Value], columns: &[usize], nulls: NullKeys) -> Option<String> {
    let mut key = String::new();
    for &idx in columns {
        match row.get(idx)? {
            Value::Null if nulls == NullKeys::Unmatched => return None,
            Value::Null => key.push_str("n|"),
            Value::Int(v) => {
                let _ = write!(key, "i{v}|");
            }
            Value::Str(s) => {
                let _ = write!(key, "s{}:{s}|", s.len());
            }
        }
    }
    Some(key)
}

fn key_frame(
    table: &Table,
    columns: &[usize],
    nulls: NullKeys,
    key_name: &str,
    row_name: &str,
) -> Result<DataFrame> {
    let keys: Vec<Option<String>> = table
        .rows()
        .iter()
        .map(|row| encode_key(row, columns, nulls))
        .collect();
    let frame = DataFrame::new(vec![
        Column::new(key_name.into(), keys),
        Column::new_row_index(row_name.into(), 0, table.height())?,
    ])?;
    Ok(frame)
}

fn row_frame(table: &Table, row_name: &str) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![Column::new_row_index(
        row_name.into(),
        0,
        table.height(),
    )?])?;
    Ok(frame)
}

fn position(idx: IdxSize) -> usize {
    idx as usize
}

fn row_positions(frame: &DataFrame, name: &str) -> Result<Vec<Option<usize>>> {
    Ok(frame
        .column(name)?
        .idx()?
        .into_iter()
        .map(|idx| idx.map(position))
        .collect())
}

fn join_type(how: JoinHow) -> JoinType {
    match how {
        JoinHow::Inner => JoinType::Inner,
        JoinHow::Left => JoinType::Left,
        JoinHow::Right => JoinType::Right,
        JoinHow::Outer => JoinType::Full,
        JoinHow::Cross => JoinType::Cross,
    }
}

/// Row pairs of a join between `left` and `right` on the given key columns.
///
/// Pairs come back in table order. Inner, left and outer joins follow the
/// left rows and then right match order, with unmatched right rows of an
/// outer join last. Right joins follow the right rows.
pub(crate) fn join_positions(
    left: &Table,
    left_keys: &[usize],
    right: &Table,
    right_keys: &[usize],
    how: JoinHow,
) -> Result<Vec<JoinPair>> {
    let joined = if how == JoinHow::Cross {
        row_frame(left, LEFT_ROW)?.cross_join(&row_frame(right, RIGHT_ROW)?, None, None)?
    } else {
        let l = key_frame(left, left_keys, NullKeys::Unmatched, LEFT_KEY, LEFT_ROW)?;
        let r = key_frame(right, right_keys, NullKeys::Unmatched, RIGHT_KEY, RIGHT_ROW)?;
        l.join(&r, [LEFT_KEY], [RIGHT_KEY], JoinArgs::new(join_type(how)), None)?
    };

    let mut pairs: Vec<JoinPair> = row_positions(&joined, LEFT_ROW)?
        .into_iter()
        .zip(row_positions(&joined, RIGHT_ROW)?)
        .collect();
    // polars leaves the output order of a hash join unspecified
    if how == JoinHow::Right {
        pairs.sort_unstable_by_key(|&(l, r)| (r.is_none(), r, l));
    } else {
        pairs.sort_unstable_by_key(|&(l, r)| (l.is_none(), l, r));
    }
    Ok(pairs)
}

/// Row positions of `table` grouped by the given columns, groups in order of
/// first appearance.
pub(crate) fn group_positions(table: &Table, columns: &[usize]) -> Result<Vec<Vec<usize>>> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let frame = key_frame(table, columns, NullKeys::Grouped, KEY, ROW)?;
    let groups = frame.group_by_stable([KEY])?.groups()?;
    let members = groups.column(GROUPS)?.list()?;
    let mut out = Vec::with_capacity(members.len());
    for group in members.into_iter().flatten() {
        out.push(group.idx()?.into_iter().flatten().map(position).collect());
    }
    Ok(out)
}

/// Position of the first occurrence of every distinct row, in table order.
pub(crate) fn first_positions(table: &Table) -> Result<Vec<usize>> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let all: Vec<usize> = (0..table.width()).collect();
    let frame = key_frame(table, &all, NullKeys::Grouped, KEY, ROW)?;
    let subset = [KEY.to_string()];
    let unique = frame.unique_stable(Some(&subset[..]), UniqueKeepStrategy::First, None)?;
    Ok(row_positions(&unique, ROW)?.into_iter().flatten().collect())
}
