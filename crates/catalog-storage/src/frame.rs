//! Conversion between polars `DataFrame`s and catalog [`Table`]s.
//!
//! Local storage reads and writes through polars. Integral cells become
//! [`Value::Int`], everything else becomes [`Value::Str`]; nulls stay nulls.

use polars::prelude::{AnyValue, Column, DataFrame, IntoColumn, NamedFrom, PolarsResult, Series};

use catalog_model::{Table, Value};

use crate::error::Result;

/// Converts a Polars `AnyValue` into a catalog [`Value`].
pub fn any_to_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Int8(v) => Value::Int(i64::from(v)),
        AnyValue::Int16(v) => Value::Int(i64::from(v)),
        AnyValue::Int32(v) => Value::Int(i64::from(v)),
        AnyValue::Int64(v) => Value::Int(v),
        AnyValue::UInt8(v) => Value::Int(i64::from(v)),
        AnyValue::UInt16(v) => Value::Int(i64::from(v)),
        AnyValue::UInt32(v) => Value::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or_else(|_| Value::Str(v.to_string()), Value::Int),
        AnyValue::Float32(v) => float_to_value(f64::from(v)),
        AnyValue::Float64(v) => float_to_value(v),
        AnyValue::String(s) => Value::Str(s.to_string()),
        AnyValue::StringOwned(s) => Value::Str(s.to_string()),
        AnyValue::Boolean(b) => Value::Str(b.to_string()),
        other => Value::Str(other.to_string()),
    }
}

/// Integer-valued floats (pandas-style `1.0` columns with gaps) become integers.
fn float_to_value(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::Int(v as i64)
    } else {
        Value::Str(format_numeric(v))
    }
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Reads every cell of `df` into a row-major [`Table`].
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();
    let columns = df.get_columns();
    let mut table = Table::new(names)?;
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|column| column.get(row_idx).map(any_to_value))
            .collect::<PolarsResult<Vec<Value>>>()?;
        table.push_row(row)?;
    }
    Ok(table)
}

/// Builds a `DataFrame` from a [`Table`].
///
/// A column whose non-null cells are all integers becomes an `Int64` column;
/// any other column becomes a `String` column.
pub fn table_to_dataframe(table: &Table) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.width());
    for (idx, name) in table.columns().iter().enumerate() {
        let cells = table.rows().iter().map(|row| &row[idx]);
        let all_int = cells
            .clone()
            .all(|value| matches!(value, Value::Null | Value::Int(_)));
        let series = if all_int {
            let values: Vec<Option<i64>> = cells.map(Value::as_int).collect();
            Series::new(name.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .map(|value| match value {
                    Value::Null => None,
                    Value::Int(v) => Some(v.to_string()),
                    Value::Str(s) => Some(s.clone()),
                })
                .collect();
            Series::new(name.as_str().into(), values)
        };
        columns.push(series.into_column());
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_value() {
        assert_eq!(any_to_value(AnyValue::Null), Value::Null);
        assert_eq!(any_to_value(AnyValue::Int32(3)), Value::Int(3));
        assert_eq!(any_to_value(AnyValue::Float64(2.0)), Value::Int(2));
        assert_eq!(any_to_value(AnyValue::Float64(2.5)), Value::from("2.5"));
        assert_eq!(any_to_value(AnyValue::String("c1")), Value::from("c1"));
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.5), "1.5");
        assert_eq!(format_numeric(1.50), "1.5");
        assert_eq!(format_numeric(100.0), "100");
    }

    #[test]
    fn test_table_dataframe_conversion() {
        let table = Table::from_rows(
            ["course_id", "course_level"],
            vec![
                vec![Value::from("c1"), Value::from(1)],
                vec![Value::from("c2"), Value::Null],
            ],
        )
        .unwrap();
        let df = table_to_dataframe(&table).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("course_level").unwrap().dtype(),
            &polars::prelude::DataType::Int64
        );

        let back = dataframe_to_table(&df).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_mixed_column_becomes_string() {
        let table = Table::from_rows(
            ["code"],
            vec![vec![Value::from(7)], vec![Value::from("X7")]],
        )
        .unwrap();
        let df = table_to_dataframe(&table).unwrap();
        assert_eq!(
            df.column("code").unwrap().dtype(),
            &polars::prelude::DataType::String
        );
    }
}
