//! Human-readable dumps of tables for debugging.

use std::fmt::Write;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::error::ArrowError;
use arrow::row::{RowConverter, SortField};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::util::pretty::pretty_format_batches;

use crate::frame::Table;

/// Upper-case name of a column type, as shown in schema dumps.
pub fn type_string(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOL8",
        DataType::Int8 => "INT8",
        DataType::Int16 => "INT16",
        DataType::Int32 => "INT32",
        DataType::Int64 => "INT64",
        DataType::Float32 => "FLOAT32",
        DataType::Float64 => "FLOAT64",
        DataType::Utf8 | DataType::LargeUtf8 => "STRING",
        DataType::Date32 => "TIMESTAMP_DAYS",
        DataType::Timestamp(TimeUnit::Second, _) => "TIMESTAMP_SECONDS",
        DataType::Timestamp(TimeUnit::Millisecond, _) => "TIMESTAMP_MILLISECONDS",
        DataType::Timestamp(TimeUnit::Microsecond, _) => "TIMESTAMP_MICROSECONDS",
        DataType::Timestamp(TimeUnit::Nanosecond, _) => "TIMESTAMP_NANOSECONDS",
        _ => "Unsupported type_id",
    }
}

/// Row and column counts plus, per column, its type, null count, min and max.
///
/// Min and max are empty for all-null columns and for types without an
/// ordering.
pub fn describe_table_schema(table: &Table, table_name: &str) -> String {
    let batch = table.batch();
    let schema = batch.schema();
    let mut out = String::new();
    let _ = writeln!(out, "Table: {}", table_name);
    let _ = writeln!(out, "\tNum Rows: {}", table.num_rows());
    let _ = writeln!(out, "\tNum Columns: {}", table.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let (min, max) = min_max(column).unwrap_or_default();
        let _ = writeln!(
            out,
            "\t{} (type: {} null_count: {} min: {} max: {})",
            field.name(),
            type_string(field.data_type()),
            column.null_count(),
            min,
            max
        );
    }
    out
}

/// Header lines followed by the full table contents.
pub fn format_table(table: &Table, table_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Table: {}", table_name);
    let _ = writeln!(out, "\tNum Rows: {}", table.num_rows());
    let _ = writeln!(out, "\tNum Columns: {}", table.num_columns());

    match pretty_format_batches(std::slice::from_ref(table.batch())) {
        Ok(pretty) => {
            let _ = writeln!(out, "{}", pretty);
        }
        Err(e) => {
            let _ = writeln!(out, "\t<unprintable: {}>", e);
        }
    }
    out
}

fn min_max(column: &ArrayRef) -> Result<(String, String), ArrowError> {
    let converter = RowConverter::new(vec![SortField::new(column.data_type().clone())])?;
    let rows = converter.convert_columns(std::slice::from_ref(column))?;

    let mut valid = (0..column.len()).filter(|&i| column.is_valid(i));
    let Some(first) = valid.next() else {
        return Ok((String::new(), String::new()));
    };

    let (mut min_idx, mut max_idx) = (first, first);
    for i in valid {
        if rows.row(i) < rows.row(min_idx) {
            min_idx = i;
        }
        if rows.row(i) > rows.row(max_idx) {
            max_idx = i;
        }
    }

    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(column.as_ref(), &options)?;
    Ok((
        formatter.value(min_idx).to_string(),
        formatter.value(max_idx).to_string(),
    ))
}
